use gritphys_core::{Scalar, Vec3};
use crate::Aabb;

/// Slab test of the displacement ray `origin + t * delta`, `t` in `[0, 1]`,
/// against `aabb`. Returns entry time and entry-face normal.
pub fn ray_aabb(origin: Vec3, delta: Vec3, aabb: &Aabb) -> Option<(Scalar, Vec3)> {
    let mut t_enter: Scalar = 0.0;
    let mut t_exit: Scalar = 1.0;
    let mut normal = Vec3::ZERO;
    for axis in 0..3 {
        let o = origin[axis];
        let d = delta[axis];
        let (mn, mx) = (aabb.min[axis], aabb.max[axis]);
        if d.abs() < 1.0e-9 {
            if o < mn || o > mx {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (mn - o) * inv;
        let mut t1 = (mx - o) * inv;
        let mut axis_n = -1.0;
        if t0 > t1 {
            core::mem::swap(&mut t0, &mut t1);
            axis_n = 1.0;
        }
        if t0 > t_enter {
            t_enter = t0;
            normal = Vec3::ZERO;
            normal[axis] = axis_n;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }
    if normal == Vec3::ZERO {
        // started inside; report immediate hit with no face preference
        return Some((0.0, Vec3::Y));
    }
    Some((t_enter, normal))
}

/// Sweep a sphere of radius `r` moving at `v` for `dt` seconds against an
/// AABB. Returns the normalized time of impact in `[0, 1]` and the surface
/// normal at impact. Conservative: the box is dilated by `r` and the
/// center is ray-cast, which can report corner hits slightly early; the
/// solver treats the result as a clamp, not an exact contact.
pub fn sweep_sphere_aabb(
    center: Vec3,
    v: Vec3,
    r: Scalar,
    aabb: &Aabb,
    dt: Scalar,
) -> Option<(Scalar, Vec3)> {
    if dt <= 0.0 {
        return None;
    }
    let dilated = aabb.expanded(r);
    let delta = v * dt;
    if delta.length_squared() < 1.0e-12 {
        return dilated.contains_point(center).then_some((0.0, Vec3::Y));
    }
    ray_aabb(center, delta, &dilated)
}
