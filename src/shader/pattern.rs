//! The cell pattern, evaluated in warped `(angle, depth)` space.
//!
//! Two layers share one tiling scheme. Each pixel belongs to angular row `i`
//! and radial column `j`. Columns scroll toward the viewer with time. Past the
//! `BORDER` depth, the next incoming column is drawn fading in from the
//! horizon instead of popping in.

use crate::shader::math::{contrast, fract, glsl_mod, mix3, smoothstep, smoothstep2};
use glam::{Vec2, Vec3};

pub const SCALE_X: f32 = 16.0;
pub const SCALE_Y: f32 = 5.0;
pub const TIME_SCALE: f32 = 0.1;
pub const BORDER: f32 = 1.4;

/// The pattern's own pi; kept at this precision so the angular tiling matches.
const PI: f32 = 3.1415926;

/// Angular cells per radian.
pub const ANGULAR_SCALE: f32 = SCALE_X / PI;

/// Seconds for the local phase to wrap: `(1 / SCALE_Y) / TIME_SCALE`.
pub const PHASE_PERIOD: f32 = 1.0 / SCALE_Y / TIME_SCALE;

const AQUA: Vec3 = Vec3::new(0.0, 1.0, 1.0);
const PINK: Vec3 = Vec3::new(1.0, 0.0, 1.0);

const BOX_EDGE: f32 = 0.001;
const BOX_SOFTNESS: f32 = 0.05;
const SATURATION: f32 = 0.7;

/// Which tiling rule a pixel falls under for the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Regular scrolling cells.
    Tiling,
    /// The incoming column near the horizon, with fade and trail.
    Horizon,
}

impl Branch {
    pub fn select(depth: f32, lt: f32) -> Self {
        if depth < BORDER - lt {
            Self::Tiling
        } else {
            Self::Horizon
        }
    }
}

pub fn hash1(n: f32) -> f32 {
    fract(n.sin() * 437518.56453) + 0.1
}

/// Per-cell brightness pulse in `[0.75, ~1.95]`.
///
/// Single octave, despite the name.
pub fn fbm(cell: Vec2, t: f32) -> f32 {
    let value = ((t * 5.0 * hash1(cell.x + hash1(cell.y))).sin() + 4.0) * 0.25;
    value.powi(3).max(0.75)
}

/// Soft rounded-square mask over cell-local `st`, dimmed toward the rim.
pub fn cell_box(st: Vec2) -> f32 {
    let lo = Vec2::splat(BOX_EDGE);
    let hi = Vec2::splat(BOX_EDGE + BOX_SOFTNESS);
    let m = smoothstep2(lo, hi, st) * smoothstep2(lo, hi, Vec2::ONE - st);
    m.x * m.y * (1.0 - (Vec2::splat(0.5) - st).length() * 0.75)
}

/// Two-stop aqua/pink ramp. `c` is `(hue, saturation, brightness)`.
pub fn hsb2rgb(c: Vec3) -> Vec3 {
    let rgb = contrast(mix3(AQUA, PINK, c.x));
    c.z * mix3(Vec3::ONE, rgb, c.y)
}

/// Position inside the current radial-tile cycle, in `[0, 1/SCALE_Y)`.
pub fn local_time(t: f32) -> f32 {
    glsl_mod(t * TIME_SCALE, 1.0 / SCALE_Y)
}

/// Checkerboard base for the horizon cubes: pink on odd `i + j`, aqua on even.
pub fn cube_base_color(i: f32, j: f32) -> Vec3 {
    if glsl_mod(i + j, 2.0) > 0.5 { PINK } else { AQUA }
}

fn cell_color(i: f32, j: f32, t: f32) -> Vec3 {
    hsb2rgb(Vec3::new(
        hash1(j + hash1(i)),
        SATURATION,
        fbm(Vec2::new(i, j), t),
    ))
}

/// A column resolved by one of the two branches.
struct Cell {
    j: f32,
    /// Folded cell-local coordinate.
    uv: Vec2,
    /// Mask weight; the box alone for tiling, box plus trail times fade on the horizon.
    coverage: f32,
}

fn tiling_cell(mut uv: Vec2, t: f32) -> Cell {
    uv.y = (uv.y + t * TIME_SCALE) * SCALE_Y;
    let j = uv.y.floor();
    uv.y = fract(uv.y);
    Cell {
        j,
        uv,
        coverage: cell_box(uv),
    }
}

fn horizon_cell(mut uv: Vec2, i: f32, t: f32, lt: f32) -> Cell {
    let fade = smoothstep(3.0, 0.0, uv.y.sqrt());
    uv.y += lt - BORDER;
    let j = ((BORDER - lt + t * TIME_SCALE) * SCALE_Y + uv.y.floor()).floor();

    // Slides the new column in from below the cell during the first part of the phase.
    let entry = 1.0 - SCALE_Y + lt * (SCALE_Y / TIME_SCALE * SCALE_Y * hash1(i + hash1(j)) + 1.0);
    uv.y = fract(uv.y) * SCALE_Y + entry.min(0.0);

    let trail = smoothstep(3.0, 1.0, uv.y.sqrt())
        * smoothstep(1.0, 1.05, uv.y)
        * smoothstep(0.5, 0.45, (uv.x - 0.5).abs())
        * 0.25;

    Cell {
        j,
        uv,
        coverage: (cell_box(uv) + trail) * fade,
    }
}

/// The radial clock of hashed-hue cells.
///
/// Also returns the folded coordinate the branch left behind; the cube layer
/// is evaluated on it.
pub fn primary(uv: Vec2, t: f32, lt: f32) -> (Vec3, Vec2) {
    let x = uv.x * ANGULAR_SCALE;
    let i = x.floor();
    let uv = Vec2::new(fract(x), uv.y);

    match Branch::select(uv.y, lt) {
        Branch::Tiling => {
            let cell = tiling_cell(uv, t);
            (cell_color(i, cell.j, t) * cell.coverage, cell.uv)
        }
        Branch::Horizon => {
            let cell = horizon_cell(uv, i, t, lt);
            let color = mix3(Vec3::ZERO, cell_color(i, cell.j, t), cell.coverage);
            (color, cell.uv)
        }
    }
}

/// The overlay layer. Horizon cells use the checkerboard and a harder curve.
pub fn flow_cubes(uv: Vec2, t: f32, lt: f32) -> Vec3 {
    let i = uv.x.floor();
    let uv = Vec2::new(fract(uv.x), uv.y);

    match Branch::select(uv.y, lt) {
        Branch::Tiling => {
            let cell = tiling_cell(uv, t);
            cell_color(i, cell.j, t) * cell.coverage
        }
        Branch::Horizon => {
            let cell = horizon_cell(uv, i, t, lt);
            let color = mix3(Vec3::ZERO, cube_base_color(i, cell.j), cell.coverage);
            let sq = color * color;
            sq * sq * (Vec3::splat(3.0) - 2.0 * color)
        }
    }
}

/// Both layers summed, before the output curve.
pub fn layered(uv: Vec2, t: f32) -> Vec3 {
    let lt = local_time(t);
    let (base, folded) = primary(uv, t, lt);
    base + flow_cubes(folded * Vec2::new(ANGULAR_SCALE, 1.0), t, lt)
}
