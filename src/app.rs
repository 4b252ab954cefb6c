use crate::config::{ClampMode, Config, MAX_SCALE, RendererMode};
use crate::engine::{RenderCtx, ShaderEngine};
use crate::logging;
use crate::render::{hard_wrap, make_renderer, Frame, Renderer};
use crate::shader::pattern::local_time;
use crate::terminal::TerminalGuard;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use log::{debug, info};
use std::io::BufWriter;
use std::time::{Duration, Instant};

const SPEED_STEP: f32 = 1.25;
const MIN_SPEED: f32 = 0.05;
const MAX_SPEED: f32 = 16.0;

pub fn run(cfg: Config) -> anyhow::Result<()> {
    if !cfg.speed.is_finite() {
        anyhow::bail!("--speed must be finite");
    }
    if !cfg.start.is_finite() {
        anyhow::bail!("--start must be finite");
    }
    if let Some(path) = logging::init_interactive(cfg.log_file.as_deref())? {
        info!("cellflow {} logging to {}", env!("CARGO_PKG_VERSION"), path.display());
    }

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let mut renderer_mode = cfg.renderer;
    let mut renderer: Box<dyn Renderer> = make_renderer(renderer_mode);
    let mut engine = ShaderEngine::new(cfg.threads, cfg.clamp);
    info!(
        "renderer={} threads={} clamp={} fps={}",
        renderer.name(),
        engine.threads(),
        engine.clamp().label(),
        cfg.fps
    );

    let mut last_size = TerminalGuard::size()?;
    let mut show_hud = true;
    let mut show_help = false;
    let mut hud_rows = hud_rows_for_size(last_size, show_hud);
    resize_engine(&mut engine, last_size, renderer_mode, hud_rows);

    let start = Instant::now();
    let mut clock = ShaderClock::new(start, cfg.start, cfg.speed);
    let mut tuning = RuntimeTuning::new(cfg.scale as usize, cfg.adaptive_scale);
    let mut fps = FpsCounter::new();
    let mut last_engine_ms = 0.0f32;
    let mut last_render_ms = 0.0f32;
    let mut last_total_ms = 0.0f32;

    loop {
        let now = Instant::now();

        // Drain input events (non-blocking).
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let Some(cmd) = command_for_key(k.code, k.modifiers) else {
                        continue;
                    };
                    debug!("command {cmd:?}");
                    match cmd {
                        Command::Quit => {
                            info!("quit at t={:.3}s", clock.elapsed(now));
                            return Ok(());
                        }
                        Command::TogglePause => clock.toggle_pause(now),
                        Command::Slower => {
                            let s = step_speed(clock.speed(), false);
                            clock.set_speed(now, s);
                        }
                        Command::Faster => {
                            let s = step_speed(clock.speed(), true);
                            clock.set_speed(now, s);
                        }
                        Command::ResetTime => clock.reset(now, cfg.start),
                        Command::CycleRenderer => {
                            renderer_mode = renderer_mode.next();
                            renderer = make_renderer(renderer_mode);
                            info!("renderer -> {}", renderer.name());
                            resize_engine(&mut engine, last_size, renderer_mode, hud_rows);
                        }
                        Command::ScaleDown => tuning.step_base(false),
                        Command::ScaleUp => tuning.step_base(true),
                        Command::ToggleClamp => {
                            let next = engine.clamp().toggle();
                            engine.set_clamp(next);
                            info!("clamp -> {}", next.label());
                        }
                        Command::ToggleHud => {
                            show_hud = !show_hud;
                            hud_rows = hud_rows_for_size(last_size, show_hud);
                            resize_engine(&mut engine, last_size, renderer_mode, hud_rows);
                        }
                        Command::ToggleHelp => show_help = !show_help,
                    }
                }
                Event::Resize(c, r) => {
                    last_size = (c, r);
                    info!("terminal resized to {c}x{r}");
                    hud_rows = hud_rows_for_size(last_size, show_hud);
                    resize_engine(&mut engine, last_size, renderer_mode, hud_rows);
                }
                _ => {}
            }
        }

        // Resize events can be missed by some terminals.
        let sz = crossterm::terminal::size()?;
        if sz != last_size {
            last_size = sz;
            hud_rows = hud_rows_for_size(last_size, show_hud);
            resize_engine(&mut engine, last_size, renderer_mode, hud_rows);
        }

        let t = clock.elapsed(now);
        let (term_cols, term_rows) = last_size;

        let hud = if show_hud {
            build_wrapped_hud(
                term_cols as usize,
                &HudStats {
                    t,
                    speed: clock.speed(),
                    paused: clock.paused(),
                    width: engine.width(),
                    height: engine.height(),
                    scale: tuning.scale,
                    adaptive: tuning.adaptive,
                    threads: engine.threads(),
                    clamp: engine.clamp(),
                    fps: fps.fps(),
                    engine_ms: last_engine_ms,
                    render_ms: last_render_ms,
                    total_ms: last_total_ms,
                    renderer: renderer.name(),
                },
            )
        } else {
            String::new()
        };

        let target_hud_rows = hud_rows_for_text(term_rows, show_hud, &hud);
        if target_hud_rows != hud_rows {
            hud_rows = target_hud_rows;
            resize_engine(&mut engine, last_size, renderer_mode, hud_rows);
        }
        let visual_rows = term_rows.saturating_sub(hud_rows).max(1);

        let (pixel_width, pixel_height) = (engine.width(), engine.height());
        let engine_start = Instant::now();
        let pixels = engine.render(RenderCtx {
            t,
            scale: tuning.scale,
        });
        last_engine_ms = engine_start.elapsed().as_secs_f32() * 1000.0;

        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            pixel_width,
            pixel_height,
            pixels_rgba: pixels,
            hud: &hud,
            hud_rows,
            overlay: show_help.then(help_popup_text),
            sync_updates: cfg.sync_updates,
        };

        let render_start = Instant::now();
        renderer.render(&frame, &mut out)?;
        last_render_ms = render_start.elapsed().as_secs_f32() * 1000.0;
        last_total_ms = now.elapsed().as_secs_f32() * 1000.0;

        fps.tick();
        tuning.update(last_total_ms, 1000.0 / cfg.fps as f32);

        // Frame pacing.
        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

fn resize_engine(engine: &mut ShaderEngine, size: (u16, u16), mode: RendererMode, hud_rows: u16) {
    let (w, h) = pixel_size(size, mode, hud_rows);
    engine.resize(w, h);
}

/// Shader resolution for a terminal of `size` cells with `hud_rows` reserved.
pub fn pixel_size(size: (u16, u16), mode: RendererMode, hud_rows: u16) -> (usize, usize) {
    let (cols, rows) = size;
    let (px_w, px_h) = mode.cell_pixels();
    let visual_rows = rows.saturating_sub(hud_rows).max(1);
    (
        (cols as usize).saturating_mul(px_w),
        (visual_rows as usize).saturating_mul(px_h),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    TogglePause,
    Slower,
    Faster,
    ResetTime,
    CycleRenderer,
    ScaleDown,
    ScaleUp,
    ToggleClamp,
    ToggleHud,
    ToggleHelp,
}

pub fn command_for_key(code: KeyCode, mods: KeyModifiers) -> Option<Command> {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return Some(Command::Quit);
    }

    let cmd = match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        KeyCode::Char(' ') => Command::TogglePause,
        KeyCode::Left => Command::Slower,
        KeyCode::Right => Command::Faster,
        KeyCode::Char('0') => Command::ResetTime,
        KeyCode::Char('r') | KeyCode::Char('R') => Command::CycleRenderer,
        KeyCode::Char('[') => Command::ScaleDown,
        KeyCode::Char(']') => Command::ScaleUp,
        KeyCode::Char('c') | KeyCode::Char('C') => Command::ToggleClamp,
        KeyCode::Char('i') | KeyCode::Char('I') => Command::ToggleHud,
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::F(1) => {
            Command::ToggleHelp
        }
        _ => return None,
    };
    Some(cmd)
}

pub fn step_speed(speed: f32, faster: bool) -> f32 {
    let next = if faster {
        speed * SPEED_STEP
    } else {
        speed / SPEED_STEP
    };
    next.clamp(MIN_SPEED, MAX_SPEED)
}

/// Shader time derived from wall-clock time, with speed changes and pauses
/// that never make it jump.
#[derive(Debug, Clone, Copy)]
pub struct ShaderClock {
    base: f32,
    anchor: Instant,
    speed: f32,
    paused: bool,
}

impl ShaderClock {
    pub fn new(now: Instant, start: f32, speed: f32) -> Self {
        Self {
            base: start,
            anchor: now,
            speed,
            paused: false,
        }
    }

    pub fn elapsed(&self, now: Instant) -> f32 {
        if self.paused {
            return self.base;
        }
        self.base + now.saturating_duration_since(self.anchor).as_secs_f32() * self.speed
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_speed(&mut self, now: Instant, speed: f32) {
        self.rebase(now);
        self.speed = speed;
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        self.rebase(now);
        self.paused = !self.paused;
    }

    pub fn reset(&mut self, now: Instant, to: f32) {
        self.base = to;
        self.anchor = now;
    }

    fn rebase(&mut self, now: Instant) {
        self.base = self.elapsed(now);
        self.anchor = now;
    }
}

pub struct HudStats<'a> {
    pub t: f32,
    pub speed: f32,
    pub paused: bool,
    pub width: usize,
    pub height: usize,
    pub scale: usize,
    pub adaptive: bool,
    pub threads: usize,
    pub clamp: ClampMode,
    pub fps: f32,
    pub engine_ms: f32,
    pub render_ms: f32,
    pub total_ms: f32,
    pub renderer: &'a str,
}

pub fn build_wrapped_hud(cols: usize, s: &HudStats<'_>) -> String {
    let logical_lines = [
        format!(
            "t: {:>8.2}s | lt: {:.3} | Speed: {:.2}x{} | Res: {}x{} | Scale: {}{} | Clamp: {} | FPS: {:>4.1}",
            s.t,
            local_time(s.t),
            s.speed,
            if s.paused { " (paused)" } else { "" },
            s.width,
            s.height,
            s.scale,
            if s.adaptive { " (auto)" } else { "" },
            s.clamp.label(),
            s.fps,
        ),
        format!(
            "ms(E/R/T): {:>4.1}/{:>4.1}/{:>4.1} | Threads: {} | Renderer: {}",
            s.engine_ms, s.render_ms, s.total_ms, s.threads, s.renderer
        ),
        "Keys: space pause | ←/→ speed | 0 reset | r renderer | [/] scale | c clamp | i HUD | ?/h help | q quit".to_string(),
    ];

    logical_lines
        .iter()
        .flat_map(|line| hard_wrap(line, cols))
        .collect::<Vec<_>>()
        .join("\n")
}

fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud {
        return 0;
    }
    let rows = size.1;
    if rows <= 1 {
        return 0;
    }
    (rows - 1).min(3)
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let max_rows = term_rows.saturating_sub(1);
    let wanted = hud.lines().count() as u16;
    wanted.min(max_rows)
}

fn help_popup_text() -> &'static str {
    "cellflow hotkeys\n\
space  pause / resume\n\
←/→  slower / faster\n\
0  reset time to --start\n\
r  cycle renderer: half-block/braille/sextant/ascii\n\
[ / ]  block scale down / up\n\
c  toggle clamp: final / pre-curve\n\
i  show/hide HUD\n\
? or h or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}

/// Picks the block scale from an EMA of frame time.
///
/// Never goes finer than `base_scale`; the user moves that with `[` and `]`.
pub struct RuntimeTuning {
    pub base_scale: usize,
    pub scale: usize,
    pub adaptive: bool,
    ema_ms: f32,
}

impl RuntimeTuning {
    pub fn new(base_scale: usize, adaptive: bool) -> Self {
        let base_scale = base_scale.clamp(1, MAX_SCALE as usize);
        Self {
            base_scale,
            scale: base_scale,
            adaptive,
            ema_ms: 0.0,
        }
    }

    pub fn step_base(&mut self, coarser: bool) {
        self.base_scale = if coarser {
            (self.base_scale + 1).min(MAX_SCALE as usize)
        } else {
            self.base_scale.saturating_sub(1).max(1)
        };
        self.scale = self.base_scale;
        self.ema_ms = 0.0;
    }

    pub fn update(&mut self, frame_ms: f32, target_ms: f32) {
        if !self.adaptive {
            return;
        }
        self.ema_ms = if self.ema_ms == 0.0 {
            frame_ms
        } else {
            self.ema_ms * 0.95 + frame_ms * 0.05
        };

        if self.ema_ms > target_ms * 1.22 && self.scale < MAX_SCALE as usize {
            self.scale += 1;
            debug!("adaptive scale up to {} (ema {:.2} ms)", self.scale, self.ema_ms);
            self.ema_ms = 0.0;
        } else if self.ema_ms < target_ms * 0.72 && self.scale > self.base_scale {
            self.scale -= 1;
            debug!("adaptive scale down to {} (ema {:.2} ms)", self.scale, self.ema_ms);
            self.ema_ms = 0.0;
        }
    }
}
