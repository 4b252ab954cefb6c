use crate::config::ClampMode;
use crate::shader::FrameInput;
use glam::Vec2;
use log::debug;

/// Per-frame inputs from the host loop.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    /// Elapsed shader time in seconds.
    pub t: f32,
    /// Block size; one evaluation fills `scale x scale` pixels and is taken at
    /// the center of the block's top-left pixel.
    pub scale: usize,
}

/// Evaluates the shader over a top-down RGBA8 buffer.
pub struct ShaderEngine {
    front: Vec<u8>,
    w: usize,
    h: usize,
    threads: usize,
    clamp: ClampMode,
}

impl ShaderEngine {
    /// `threads == 0` uses the available parallelism.
    pub fn new(threads: usize, clamp: ClampMode) -> Self {
        Self {
            front: Vec::new(),
            w: 0,
            h: 0,
            threads: resolve_threads(threads),
            clamp,
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        if w == self.w && h == self.h {
            return;
        }
        debug!("engine resize {}x{} -> {}x{}", self.w, self.h, w, h);
        self.w = w;
        self.h = h;
        let n = w.saturating_mul(h).saturating_mul(4);
        self.front.clear();
        self.front.resize(n, 0);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn clamp(&self) -> ClampMode {
        self.clamp
    }

    pub fn set_clamp(&mut self, clamp: ClampMode) {
        self.clamp = clamp;
    }

    pub fn pixels(&self) -> &[u8] {
        &self.front
    }

    pub fn render(&mut self, ctx: RenderCtx) -> &[u8] {
        if self.w == 0 || self.h == 0 {
            return &self.front;
        }

        let w = self.w;
        let h = self.h;
        let scale = ctx.scale.max(1);
        let frame = FrameInput::new(ctx.t, w as f32, h as f32);
        let clamp = self.clamp;

        // Bands hold whole blocks so no block straddles two workers.
        let blocks_down = h.div_ceil(scale);
        let workers = self.threads.clamp(1, blocks_down);
        let band_rows = blocks_down.div_ceil(workers) * scale;
        let band_len = band_rows * w * 4;

        if workers == 1 {
            shade_band(&frame, clamp, &mut self.front, 0, w, h, scale);
        } else {
            std::thread::scope(|s| {
                for (band, chunk) in self.front.chunks_mut(band_len).enumerate() {
                    let frame = &frame;
                    s.spawn(move || shade_band(frame, clamp, chunk, band * band_rows, w, h, scale));
                }
            });
        }

        &self.front
    }
}

fn resolve_threads(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Fill rows `row0..row0 + band.len() / (w * 4)` of the frame.
fn shade_band(
    frame: &FrameInput,
    clamp: ClampMode,
    band: &mut [u8],
    row0: usize,
    w: usize,
    h: usize,
    scale: usize,
) {
    let rows = band.len() / (w * 4);
    for by in (0..rows).step_by(scale) {
        // Buffer rows run top-down; shader y runs bottom-up.
        let py = (h - (row0 + by)) as f32 - 0.5;
        for bx in (0..w).step_by(scale) {
            let px = bx as f32 + 0.5;
            let rgba = quantize(frame.shade_with(Vec2::new(px, py), clamp).to_array());

            for y in by..(by + scale).min(rows) {
                let line = y * w * 4;
                for x in bx..(bx + scale).min(w) {
                    let i = line + x * 4;
                    band[i..i + 4].copy_from_slice(&rgba);
                }
            }
        }
    }
}

fn quantize(c: [f32; 3]) -> [u8; 4] {
    [
        (c[0] * 255.0).round() as u8,
        (c[1] * 255.0).round() as u8,
        (c[2] * 255.0).round() as u8,
        255,
    ]
}
