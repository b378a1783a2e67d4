use gritphys_core::{Scalar, Vec3, Isometry};
use crate::Aabb;

/// Bounding sphere used to prune narrow-phase candidates. The `EMPTY`
/// sentinel has negative radius and is the identity of `merged`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingSphere { pub center: Vec3, pub radius: Scalar }

impl BoundingSphere {
    pub const EMPTY: BoundingSphere = BoundingSphere { center: Vec3::ZERO, radius: -1.0 };

    #[inline] pub fn new(center: Vec3, radius: Scalar) -> Self { Self { center, radius } }

    #[inline] pub fn is_empty(&self) -> bool { self.radius < 0.0 }

    /// Centroid sphere over a point set; exact enough for pruning, never
    /// smaller than the farthest point.
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() { return Self::EMPTY; }
        let mut c = Vec3::ZERO;
        for &p in points { c += p; }
        c /= points.len() as Scalar;
        let mut r2: Scalar = 0.0;
        for &p in points { r2 = r2.max((p - c).length_squared()); }
        Self { center: c, radius: r2.sqrt() }
    }

    /// Smallest sphere enclosing both; commutative and monotone.
    pub fn merged(&self, other: &BoundingSphere) -> BoundingSphere {
        if self.is_empty() { return *other; }
        if other.is_empty() { return *self; }
        let d = (other.center - self.center).length();
        if d + other.radius <= self.radius { return *self; }
        if d + self.radius <= other.radius { return *other; }
        let r = (d + self.radius + other.radius) * 0.5;
        let dir = if d > 1.0e-12 { (other.center - self.center) / d } else { Vec3::X };
        BoundingSphere { center: self.center + dir * (r - self.radius), radius: r }
    }

    #[inline] pub fn intersects_sphere(&self, other: &BoundingSphere) -> bool {
        if self.is_empty() || other.is_empty() { return false; }
        let rsum = self.radius + other.radius;
        (other.center - self.center).length_squared() <= rsum * rsum
    }

    #[inline] pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if self.is_empty() || aabb.is_empty() { return false; }
        let q = self.center.clamp(aabb.min, aabb.max);
        (q - self.center).length_squared() <= self.radius * self.radius
    }

    #[inline] pub fn contains_point(&self, p: Vec3) -> bool {
        !self.is_empty() && (p - self.center).length_squared() <= self.radius * self.radius
    }

    #[inline] pub fn transformed(&self, xf: &Isometry) -> BoundingSphere {
        BoundingSphere { center: xf.transform_point(self.center), radius: self.radius }
    }

    #[inline] pub fn aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(self.center, Vec3::splat(self.radius.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gritphys_core::vec3;

    #[test] fn empty_is_merge_identity() {
        let s = BoundingSphere::new(vec3(1.0, 0.0, 0.0), 2.0);
        assert_eq!(BoundingSphere::EMPTY.merged(&s), s);
        assert_eq!(s.merged(&BoundingSphere::EMPTY), s);
    }

    #[test] fn merged_encloses_both() {
        let a = BoundingSphere::new(vec3(-2.0, 0.0, 0.0), 1.0);
        let b = BoundingSphere::new(vec3(3.0, 0.0, 0.0), 0.5);
        let m = a.merged(&b);
        assert!(m.contains_point(vec3(-3.0, 0.0, 0.0)));
        assert!(m.contains_point(vec3(3.5, 0.0, 0.0)));
        let m2 = b.merged(&a);
        assert!((m.radius - m2.radius).abs() < 1e-5);
    }

    #[test] fn containment_short_circuits() {
        let big = BoundingSphere::new(Vec3::ZERO, 10.0);
        let small = BoundingSphere::new(vec3(1.0, 1.0, 0.0), 0.5);
        assert_eq!(big.merged(&small), big);
    }

    #[test] fn from_points_encloses() {
        let pts = [vec3(0.0, 0.0, 0.0), vec3(2.0, 0.0, 0.0), vec3(0.0, 2.0, 0.0)];
        let s = BoundingSphere::from_points(&pts);
        for &p in &pts { assert!(s.contains_point(p)); }
    }
}
