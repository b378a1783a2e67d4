use glam::Mat3A;
use gritphys_core::{Scalar, Vec3};

/// Plane in constant-normal form: `normal . x + intercept = 0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane { pub normal: Vec3, pub intercept: Scalar }

impl Plane {
    #[inline] pub fn new(normal: Vec3, intercept: Scalar) -> Self { Self { normal, intercept } }

    #[inline] pub fn from_normal_and_point(normal: Vec3, p: Vec3) -> Self {
        Self { normal, intercept: -normal.dot(p) }
    }

    #[inline] pub fn signed_distance(&self, p: Vec3) -> Scalar {
        self.normal.dot(p) + self.intercept
    }

    #[inline] pub fn flipped(&self) -> Plane {
        Plane { normal: -self.normal, intercept: -self.intercept }
    }
}

/// Line of intersection of two planes, computed in homogeneous coordinates:
/// the direction is `n0 x n1` and a point is solved from the 3x3 system
/// `[n0; n1; dir] p = [-d0; -d1; 0]`. Near-parallel planes make the system
/// singular; a determinant magnitude below `1e-7` reports `None` instead of
/// dividing by a near-zero value.
pub fn plane_plane_intersection(p0: &Plane, p1: &Plane) -> Option<(Vec3, Vec3)> {
    let dir = p0.normal.cross(p1.normal);
    let m = Mat3A::from_cols(
        Vec3::new(p0.normal.x, p1.normal.x, dir.x),
        Vec3::new(p0.normal.y, p1.normal.y, dir.y),
        Vec3::new(p0.normal.z, p1.normal.z, dir.z),
    );
    let det = m.determinant();
    if det.abs() < 1.0e-7 {
        return None;
    }
    let rhs = Vec3::new(-p0.intercept, -p1.intercept, 0.0);
    let point = m.inverse() * rhs;
    Some((point, dir / dir.length()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gritphys_core::vec3;

    #[test] fn axis_planes_intersect_in_axis_line() {
        let px = Plane::from_normal_and_point(Vec3::X, vec3(2.0, 0.0, 0.0));
        let py = Plane::from_normal_and_point(Vec3::Y, vec3(0.0, 3.0, 0.0));
        let (p, dir) = plane_plane_intersection(&px, &py).unwrap();
        assert!((p.x - 2.0).abs() < 1e-5);
        assert!((p.y - 3.0).abs() < 1e-5);
        assert!(dir.cross(Vec3::Z).length() < 1e-6);
        assert!(px.signed_distance(p).abs() < 1e-5);
        assert!(py.signed_distance(p).abs() < 1e-5);
    }

    #[test] fn near_parallel_planes_report_none() {
        let a = Plane::from_normal_and_point(Vec3::Y, Vec3::ZERO);
        let b = Plane::from_normal_and_point(
            (Vec3::Y + vec3(1.0e-8, 0.0, 0.0)).normalize(),
            vec3(0.0, 1.0, 0.0),
        );
        assert!(plane_plane_intersection(&a, &b).is_none());
    }

    #[test] fn signed_distance_sign() {
        let ground = Plane::from_normal_and_point(Vec3::Y, Vec3::ZERO);
        assert!(ground.signed_distance(vec3(0.0, 1.0, 0.0)) > 0.0);
        assert!(ground.signed_distance(vec3(0.0, -1.0, 0.0)) < 0.0);
    }
}
