//! The per-pixel shading function.
//!
//! Everything here is pure: a color depends only on the pixel position, the
//! viewport resolution and the elapsed time. Pixels can be evaluated in any
//! order, on any thread, and come out bit-identical.
//!
//! Pixel positions follow the fragment-shader convention: the origin is the
//! bottom-left corner and `(x + 0.5, y + 0.5)` is the center of pixel `(x, y)`.

pub mod coords;
pub mod math;
pub mod pattern;

pub use crate::config::ClampMode;
pub use pattern::{Branch, PHASE_PERIOD};

use glam::{Vec2, Vec3};

pub type Rgb = Vec3;

/// Frame-global inputs, fixed for every pixel of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub elapsed_seconds: f32,
    pub resolution: Vec2,
}

impl FrameInput {
    pub fn new(elapsed_seconds: f32, width: f32, height: f32) -> Self {
        Self {
            elapsed_seconds,
            resolution: Vec2::new(width, height),
        }
    }

    pub fn local_time(&self) -> f32 {
        pattern::local_time(self.elapsed_seconds)
    }

    pub fn shade(&self, pixel: Vec2) -> Rgb {
        self.shade_with(pixel, ClampMode::Final)
    }

    /// Final color in `[0, 1]^3`.
    pub fn shade_with(&self, pixel: Vec2, clamp: ClampMode) -> Rgb {
        let uv = coords::warp(pixel, self.resolution);
        if !uv.is_finite() {
            // The vanishing point (or a degenerate viewport). Every layer fades
            // to black as depth grows, so black is the limit.
            return Rgb::ZERO;
        }

        let mut color = pattern::layered(uv, self.elapsed_seconds);
        if clamp == ClampMode::PreCurve {
            color = math::saturate(color);
        }
        math::saturate(math::contrast(color))
    }

    /// Which tiling rule the primary layer uses at `pixel`, or `None` at the
    /// vanishing point.
    pub fn branch(&self, pixel: Vec2) -> Option<Branch> {
        let uv = coords::warp(pixel, self.resolution);
        uv.is_finite()
            .then(|| Branch::select(uv.y, self.local_time()))
    }
}

/// The evaluation contract: one pixel, one frame, one color.
///
/// Total for all inputs; never panics and never returns NaN.
pub fn evaluate_pixel(
    pixel_x: f32,
    pixel_y: f32,
    resolution_w: f32,
    resolution_h: f32,
    elapsed_seconds: f32,
) -> [f32; 3] {
    FrameInput::new(elapsed_seconds, resolution_w, resolution_h)
        .shade(Vec2::new(pixel_x, pixel_y))
        .to_array()
}
