use glam::Vec2;

/// Center on the viewport and normalize by its height.
///
/// Width is not normalized separately, so `x` spans `±w/h` on wide viewports.
#[inline]
pub fn aspect_correct(pixel: Vec2, resolution: Vec2) -> Vec2 {
    (2.0 * pixel - resolution) / resolution.y
}

/// Polar warp: `(atan2(x, y), r / dot(p, p))`.
///
/// The angle is measured from the +y axis, clockwise. At the exact center
/// the radial component is NaN; callers check `is_finite` on it.
#[inline]
pub fn polar_warp(p: Vec2) -> Vec2 {
    let a = p.x.atan2(p.y);
    let r = p.length();
    Vec2::new(a, r / p.dot(p))
}

/// Raw pixel position to warped `(angle, depth)` space.
#[inline]
pub fn warp(pixel: Vec2, resolution: Vec2) -> Vec2 {
    polar_warp(aspect_correct(pixel, resolution))
}
