use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use cellflow::config::ClampMode;
use cellflow::engine::{RenderCtx, ShaderEngine};
use cellflow::logging;
use clap::{Parser, ValueEnum};
use log::{debug, info};

const DEFAULT_OUTPUT: &str = "cellflow.mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// H.264 video through ffmpeg.
    Mp4,
    /// One binary PPM per frame in the `--out` directory.
    Ppm,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "export_frames",
    version,
    about = "Offline cellflow export (MP4 via ffmpeg, or a PPM frame sequence)"
)]
pub(crate) struct Cli {
    #[arg(long, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    pub(crate) out: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Mp4)]
    pub(crate) format: OutputFormat,

    #[arg(long, default_value_t = 1280)]
    pub(crate) width: usize,

    #[arg(long, default_value_t = 720)]
    pub(crate) height: usize,

    #[arg(long, default_value_t = 60)]
    pub(crate) fps: u32,

    #[arg(long, value_name = "SECONDS", default_value_t = 20.0)]
    pub(crate) duration: f32,

    /// Shader time of the first frame.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub(crate) start: f32,

    #[arg(long, value_enum, default_value_t = ClampMode::Final)]
    pub(crate) clamp: ClampMode,

    #[arg(long, default_value_t = 0)]
    pub(crate) threads: usize,
}

pub(crate) fn compute_frame_count(duration_s: f32, fps: u32) -> usize {
    ((duration_s.max(0.0) * fps as f32).floor() as usize).max(1)
}

/// Shader time of frame `index`.
pub(crate) fn frame_time(start_s: f32, index: usize, fps: u32) -> f32 {
    start_s + index as f32 / fps as f32
}

pub(crate) fn frame_file_name(index: usize) -> String {
    format!("frame_{index:05}.ppm")
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.width == 0 {
        bail!("--width must be >= 1");
    }
    if args.height == 0 {
        bail!("--height must be >= 1");
    }
    if args.fps == 0 {
        bail!("--fps must be >= 1");
    }
    if !args.duration.is_finite() || args.duration <= 0.0 {
        bail!("--duration must be > 0 seconds");
    }
    if !args.start.is_finite() {
        bail!("--start must be finite");
    }
    Ok(())
}

/// Binary P6 PPM of a top-down RGBA8 frame; alpha is dropped.
pub(crate) fn write_ppm(
    sink: &mut dyn Write,
    width: usize,
    height: usize,
    rgba: &[u8],
) -> Result<()> {
    let need = width * height * 4;
    if rgba.len() < need {
        bail!("frame buffer too small (need {need}, got {})", rgba.len());
    }
    write!(sink, "P6\n{width} {height}\n255\n")?;
    let rgb: Vec<u8> = rgba[..need]
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    sink.write_all(&rgb)?;
    Ok(())
}

fn main() -> Result<()> {
    logging::init_batch();
    let args = Cli::parse();
    run(args)
}

fn run(args: Cli) -> Result<()> {
    validate_args(&args)?;

    let frame_count = compute_frame_count(args.duration, args.fps);
    let mut engine = ShaderEngine::new(args.threads, args.clamp);
    engine.resize(args.width, args.height);
    info!(
        "exporting {} frames of {}x{} @ {} fps (threads={}, clamp={})",
        frame_count,
        args.width,
        args.height,
        args.fps,
        engine.threads(),
        args.clamp.label()
    );

    let started = Instant::now();
    match args.format {
        OutputFormat::Mp4 => export_mp4(&args, &mut engine, frame_count)?,
        OutputFormat::Ppm => export_ppm(&args, &mut engine, frame_count)?,
    }

    let encoded_duration_s = frame_count as f32 / args.fps as f32;
    info!("export took {:.2}s", started.elapsed().as_secs_f32());
    println!(
        "exported {} frames @ {} fps (duration {:.3}s) -> {}",
        frame_count,
        args.fps,
        encoded_duration_s,
        args.out.display()
    );
    Ok(())
}

fn export_mp4(args: &Cli, engine: &mut ShaderEngine, frame_count: usize) -> Result<()> {
    ensure_ffmpeg_available()?;

    let mut parent = args.out.parent().unwrap_or_else(|| Path::new(""));
    if parent == Path::new("") {
        parent = Path::new(".");
    }
    fs::create_dir_all(parent)
        .with_context(|| format!("create output directory {}", parent.display()))?;

    let mut ffmpeg = spawn_ffmpeg(&args.out, args.width, args.height, args.fps)?;
    let mut ffmpeg_in = ffmpeg
        .stdin
        .take()
        .context("failed to open ffmpeg stdin for rawvideo input")?;

    for k in 0..frame_count {
        let t = frame_time(args.start, k, args.fps);
        let pixels = engine.render(RenderCtx { t, scale: 1 });
        ffmpeg_in
            .write_all(pixels)
            .context("write frame to ffmpeg stdin")?;
        log_progress(k, frame_count);
    }
    drop(ffmpeg_in);

    let status = ffmpeg.wait().context("wait for ffmpeg")?;
    if !status.success() {
        bail!("ffmpeg exited with status {status}");
    }
    Ok(())
}

fn export_ppm(args: &Cli, engine: &mut ShaderEngine, frame_count: usize) -> Result<()> {
    fs::create_dir_all(&args.out)
        .with_context(|| format!("create output directory {}", args.out.display()))?;

    for k in 0..frame_count {
        let t = frame_time(args.start, k, args.fps);
        let pixels = engine.render(RenderCtx { t, scale: 1 });
        let path = args.out.join(frame_file_name(k));
        let file =
            File::create(&path).with_context(|| format!("create {}", path.display()))?;
        let mut sink = BufWriter::new(file);
        write_ppm(&mut sink, args.width, args.height, pixels)
            .with_context(|| format!("write {}", path.display()))?;
        sink.flush()
            .with_context(|| format!("flush {}", path.display()))?;
        log_progress(k, frame_count);
    }
    Ok(())
}

fn log_progress(index: usize, frame_count: usize) {
    let done = index + 1;
    if done == frame_count || done % 60 == 0 {
        debug!("frame {done}/{frame_count}");
    }
}

fn ensure_ffmpeg_available() -> Result<()> {
    match Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            bail!("ffmpeg not found in PATH (install ffmpeg or use --format ppm)")
        }
        Err(err) => Err(anyhow!("failed to run ffmpeg: {err}")),
    }
}

fn spawn_ffmpeg(
    out_path: &Path,
    width: usize,
    height: usize,
    fps: u32,
) -> Result<std::process::Child> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-y")
        .arg("-f")
        .arg("rawvideo")
        .arg("-pix_fmt")
        .arg("rgba")
        .arg("-video_size")
        .arg(format!("{width}x{height}"))
        .arg("-framerate")
        .arg(fps.to_string())
        .arg("-i")
        .arg("-")
        .arg("-c:v")
        .arg("libx264")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg("-movflags")
        .arg("+faststart")
        .arg(out_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    cmd.spawn()
        .with_context(|| format!("spawn ffmpeg for output {}", out_path.display()))
}
