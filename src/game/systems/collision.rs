//! Collision primitives
//!
//! Pure functions over plain floats: circle-vs-rectangle overlap for movement
//! and pickups, and ray intersections for hitscan resolution. No state, no
//! iteration-order dependence, so identical inputs give identical outputs.

use crate::game::map::WallSegment;
use crate::util::vec2::Vec2;

/// True if the circle overlaps the rectangle
///
/// Clamps the center onto the rectangle to find the nearest point and compares
/// squared distances, so no square root is taken. Never panics; a NaN center
/// never overlaps.
#[inline]
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect: &WallSegment) -> bool {
    let (lo, hi) = rect.bounds();
    let nearest_x = center.x.max(lo.x).min(hi.x);
    let nearest_y = center.y.max(lo.y).min(hi.y);
    let dx = center.x - nearest_x;
    let dy = center.y - nearest_y;
    dx * dx + dy * dy < radius * radius
}

/// True if the circle overlaps any of the rectangles
pub fn circle_hits_any(center: Vec2, radius: f32, walls: &[WallSegment]) -> bool {
    walls.iter().any(|w| circle_intersects_rect(center, radius, w))
}

/// Slab-method ray/rectangle intersection
///
/// `dir` must be a unit vector. Returns the distance to the first boundary
/// crossing in `[0, max_range]`, or `None` when the ray misses, exits before
/// entering, or only meets the rectangle beyond range.
pub fn ray_intersects_rect(origin: Vec2, dir: Vec2, max_range: f32, rect: &WallSegment) -> Option<f32> {
    let (lo, hi) = rect.bounds();
    let (x_enter, x_exit) = slab(origin.x, dir.x, lo.x, hi.x)?;
    let (y_enter, y_exit) = slab(origin.y, dir.y, lo.y, hi.y)?;

    let t_enter = x_enter.max(y_enter);
    let t_exit = x_exit.min(y_exit);

    if t_exit < 0.0 || t_enter > t_exit {
        return None;
    }

    let t = if t_enter >= 0.0 { t_enter } else { t_exit };
    (t <= max_range).then_some(t)
}

/// Parametric entry/exit along one axis; `None` if a parallel ray is outside the slab
#[inline]
fn slab(origin: f32, dir: f32, min: f32, max: f32) -> Option<(f32, f32)> {
    if dir == 0.0 {
        if origin < min || origin > max {
            return None;
        }
        return Some((f32::NEG_INFINITY, f32::INFINITY));
    }
    let t1 = (min - origin) / dir;
    let t2 = (max - origin) / dir;
    Some((t1.min(t2), t1.max(t2)))
}

/// Ray/circle intersection via the quadratic formula
///
/// Returns the smaller non-negative root within `max_range`, or `None`.
pub fn ray_intersects_circle(origin: Vec2, dir: Vec2, max_range: f32, center: Vec2, radius: f32) -> Option<f32> {
    let a = dir.dot(dir);
    if a == 0.0 {
        return None;
    }
    let f = origin - center;
    let b = 2.0 * f.dot(dir);
    let c = f.dot(f) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let near = (-b - sqrt_d) / (2.0 * a);
    let far = (-b + sqrt_d) / (2.0 * a);

    [near, far]
        .into_iter()
        .find(|t| *t >= 0.0 && *t <= max_range)
}

/// Distance to the nearest wall along a ray, if any wall is within range
pub fn nearest_wall_hit(origin: Vec2, dir: Vec2, max_range: f32, walls: &[WallSegment]) -> Option<f32> {
    walls
        .iter()
        .filter_map(|w| ray_intersects_rect(origin, dir, max_range, w))
        .fold(None, |best: Option<f32>, t| Some(best.map_or(t, |b| b.min(t))))
}
