//! GLSL built-ins the pattern relies on, with the exact GLSL semantics.
//!
//! `smoothstep` differs from the usual clamp-based version in one way: a NaN
//! argument saturates to 0 instead of propagating. The branch-B formula takes
//! `sqrt` of values that can go negative, and GPUs clamp that NaN away.

use glam::{Vec2, Vec3};

/// `x - floor(x)`, always in `[0, 1)` for finite input.
#[inline]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

#[inline]
pub fn fract2(v: Vec2) -> Vec2 {
    v - v.floor()
}

/// GLSL `mod`: floored modulo, result carries the sign of `y`.
#[inline]
pub fn glsl_mod(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

/// Hermite threshold. `edge0 > edge1` is allowed and yields a falling edge.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    // `max` first: f32::max returns the non-NaN operand.
    let t = ((x - edge0) / (edge1 - edge0)).max(0.0).min(1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn smoothstep2(edge0: Vec2, edge1: Vec2, x: Vec2) -> Vec2 {
    Vec2::new(
        smoothstep(edge0.x, edge1.x, x.x),
        smoothstep(edge0.y, edge1.y, x.y),
    )
}

#[inline]
pub fn mix3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// `c * c * (3 - 2c)` per channel. Not clamped: values above 1.5 go negative.
#[inline]
pub fn contrast(c: Vec3) -> Vec3 {
    c * c * (Vec3::splat(3.0) - 2.0 * c)
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
#[inline]
pub fn saturate(c: Vec3) -> Vec3 {
    Vec3::new(sat(c.x), sat(c.y), sat(c.z))
}

#[inline]
fn sat(x: f32) -> f32 {
    x.max(0.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fract_handles_negatives() {
        assert!((fract(1.25) - 0.25).abs() < 1e-6);
        assert!((fract(-0.25) - 0.75).abs() < 1e-6);
        assert_eq!(fract(3.0), 0.0);
    }

    #[test]
    fn glsl_mod_is_floored() {
        assert!((glsl_mod(5.5, 2.0) - 1.5).abs() < 1e-6);
        assert!((glsl_mod(-1.0, 2.0) - 1.0).abs() < 1e-6);
        assert!((glsl_mod(-3.0, 2.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn smoothstep_edges_and_midpoint() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn smoothstep_reversed_edges_fall() {
        assert_eq!(smoothstep(3.0, 0.0, 0.0), 1.0);
        assert_eq!(smoothstep(3.0, 0.0, 3.0), 0.0);
        assert!(smoothstep(3.0, 0.0, 1.0) > smoothstep(3.0, 0.0, 2.0));
    }

    #[test]
    fn smoothstep_saturates_nan_and_infinity() {
        assert_eq!(smoothstep(0.0, 1.0, f32::NAN), 0.0);
        assert_eq!(smoothstep(3.0, 1.0, (-2.0f32).sqrt()), 0.0);
        assert_eq!(smoothstep(3.0, 0.0, f32::INFINITY), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, f32::INFINITY), 1.0);
    }

    #[test]
    fn contrast_fixes_unit_endpoints() {
        let c = contrast(Vec3::new(0.0, 0.5, 1.0));
        assert_eq!(c.x, 0.0);
        assert!((c.y - 0.5).abs() < 1e-6);
        assert_eq!(c.z, 1.0);
        assert!(contrast(Vec3::splat(1.6)).x < 0.0);
    }

    #[test]
    fn saturate_maps_nan_to_zero() {
        let c = saturate(Vec3::new(f32::NAN, -0.5, 7.0));
        assert_eq!(c, Vec3::new(0.0, 0.0, 1.0));
    }
}
