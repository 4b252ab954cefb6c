use std::time::{Duration, Instant};

use anyhow::Result;
use cellflow::config::{ClampMode, MAX_SCALE};
use cellflow::engine::{RenderCtx, ShaderEngine};
use cellflow::logging;
use log::info;

struct Args {
    frames: usize,
    w: usize,
    h: usize,
    scale: usize,
    threads: usize,
    ci_smoke: bool,
    quick: bool,
    max_ms: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 180,
        w: 160,
        h: 88,
        scale: 1,
        threads: 0,
        ci_smoke: false,
        quick: false,
        max_ms: 20.0,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--scale", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.scale = n.clamp(1, MAX_SCALE as usize);
                }
                i += 2;
            }
            ("--threads", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.threads = n;
                }
                i += 2;
            }
            ("--ci-smoke", Some(x)) if !x.starts_with("--") => {
                args.ci_smoke = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            ("--quick", Some(x)) if !x.starts_with("--") => {
                args.quick = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--quick", _) => {
                args.quick = true;
                i += 1;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.quick {
        args.frames = args.frames.min(60);
    }

    args
}

fn parse_bool(s: &str) -> Option<bool> {
    let v = s.trim().to_ascii_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

struct PassResult {
    elapsed: Duration,
    lit: usize,
}

/// Render `frames` frames at 60 fps shader time, counting frames with any lit pixel.
fn run_pass(engine: &mut ShaderEngine, frames: usize, scale: usize) -> PassResult {
    let start = Instant::now();
    let mut lit = 0usize;
    for f in 0..frames {
        let t = f as f32 / 60.0;
        let px = engine.render(RenderCtx { t, scale });
        if px.chunks_exact(4).any(|p| p[0] != 0 || p[1] != 0 || p[2] != 0) {
            lit += 1;
        }
    }
    PassResult {
        elapsed: start.elapsed(),
        lit,
    }
}

fn bench_scales(args: &Args) {
    let mut engine = ShaderEngine::new(args.threads, ClampMode::Final);
    engine.resize(args.w, args.h);
    let frames = (args.frames / 3).max(1);

    println!("Scale sweep: frames/scale={} size={}x{}", frames, args.w, args.h);
    for scale in [1usize, 2, 4, MAX_SCALE as usize] {
        let r = run_pass(&mut engine, frames, scale);
        let ms = r.elapsed.as_secs_f64() * 1000.0 / frames as f64;
        println!("  scale {:<2} {:>8.3} ms/frame  lit={:>3}/{}", scale, ms, r.lit, frames);
    }
}

fn bench_threads(args: &Args) {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let frames = (args.frames / 3).max(1);
    let mut counts = vec![1usize, 2, available];
    counts.sort_unstable();
    counts.dedup();

    println!("Thread sweep: frames/count={} size={}x{}", frames, args.w, args.h);
    for threads in counts {
        let mut engine = ShaderEngine::new(threads, ClampMode::Final);
        engine.resize(args.w, args.h);
        let r = run_pass(&mut engine, frames, args.scale);
        let ms = r.elapsed.as_secs_f64() * 1000.0 / frames as f64;
        println!("  threads {:<3} {:>8.3} ms/frame", threads, ms);
    }
}

fn bench_cpu(args: &Args) -> Result<()> {
    let mut total_time = Duration::ZERO;
    let mut total_frames = 0usize;
    let mut black_modes = Vec::<&'static str>::new();

    let mut engine = ShaderEngine::new(args.threads, ClampMode::Final);
    engine.resize(args.w, args.h);
    println!(
        "CPU benchmark: frames/mode={} size={}x{} scale={} threads={} quick={}",
        args.frames,
        args.w,
        args.h,
        args.scale,
        engine.threads(),
        args.quick
    );

    for (idx, clamp) in [ClampMode::Final, ClampMode::PreCurve].into_iter().enumerate() {
        engine.set_clamp(clamp);
        let r = run_pass(&mut engine, args.frames, args.scale);

        total_time += r.elapsed;
        total_frames += args.frames;
        let ms = r.elapsed.as_secs_f64() * 1000.0 / args.frames as f64;
        println!(
            "{:>2}. clamp={:<10} {:>8.3} ms/frame  lit={:>3}/{}",
            idx,
            clamp.label(),
            ms,
            r.lit,
            args.frames
        );
        if r.lit == 0 {
            black_modes.push(clamp.label());
        }
    }

    let avg_ms = total_time.as_secs_f64() * 1000.0 / total_frames.max(1) as f64;
    let fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
    println!("CPU summary: {:>8.3} ms/frame avg  {:>7.2} FPS", avg_ms, fps);
    info!("benchmark avg {avg_ms:.3} ms/frame");

    if !args.quick {
        bench_scales(args);
        bench_threads(args);
    }

    if args.ci_smoke {
        let failures = ci_smoke_failures(&black_modes, avg_ms, args.max_ms);
        if !failures.is_empty() {
            eprintln!("CI smoke: FAIL");
            for f in &failures {
                eprintln!("  {f}");
            }
            anyhow::bail!("ci smoke failed");
        }
        println!("CI smoke: PASS (max_ms={:.3})", args.max_ms);
    }

    Ok(())
}

/// Reasons the CI smoke gate fails: any clamp mode that rendered only black
/// frames, or an average frame time above `max_ms`.
pub(crate) fn ci_smoke_failures(black_modes: &[&str], avg_ms: f64, max_ms: f64) -> Vec<String> {
    let mut failures = Vec::new();
    if !black_modes.is_empty() {
        failures.push(format!("all-black output: {}", black_modes.join(", ")));
    }
    if avg_ms > max_ms {
        failures.push(format!("slow: {avg_ms:.3} ms/frame avg > {max_ms:.3}"));
    }
    failures
}

fn main() -> Result<()> {
    logging::init_batch();
    let args = parse_args();
    bench_cpu(&args)
}
