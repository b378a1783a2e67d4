use gritphys_core::{Scalar, Vec3};

/// Axis-aligned box. `EMPTY` and `FULL` are sentinels distinct from any
/// zero-sized box: `EMPTY` is the identity of `union`, `FULL` absorbs it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb { pub min: Vec3, pub max: Vec3 }

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(Scalar::INFINITY),
        max: Vec3::splat(Scalar::NEG_INFINITY),
    };
    pub const FULL: Aabb = Aabb {
        min: Vec3::splat(Scalar::NEG_INFINITY),
        max: Vec3::splat(Scalar::INFINITY),
    };

    #[inline] pub fn new(min: Vec3, max: Vec3) -> Self { Self { min, max } }

    #[inline] pub fn from_center_half_extents(c: Vec3, he: Vec3) -> Self {
        Self { min: c - he, max: c + he }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut r = Self::EMPTY;
        for &p in points { r.extend(p); }
        r
    }

    #[inline] pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline] pub fn center(&self) -> Vec3 { (self.min + self.max) * 0.5 }
    #[inline] pub fn half_extents(&self) -> Vec3 { (self.max - self.min) * 0.5 }

    /// Grow to enclose `p`. Extending `EMPTY` yields the point box.
    #[inline] pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Commutative, monotonically growing.
    #[inline] pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    #[inline] pub fn intersects(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x || self.min.x > other.max.x ||
          self.max.y < other.min.y || self.min.y > other.max.y ||
          self.max.z < other.min.z || self.min.z > other.max.z)
    }

    /// `None` when the boxes are disjoint.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let r = Aabb { min: self.min.max(other.min), max: self.max.min(other.max) };
        if r.is_empty() { None } else { Some(r) }
    }

    #[inline] pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    #[inline] pub fn expand_by(&mut self, r: Scalar) {
        let e = Vec3::splat(r);
        self.min -= e;
        self.max += e;
    }

    #[inline] pub fn expanded(&self, r: Scalar) -> Aabb {
        let mut a = *self;
        a.expand_by(r);
        a
    }

    /// Largest-extent axis (0/1/2), used by the BVH median split.
    pub fn longest_axis(&self) -> usize {
        let e = self.max - self.min;
        if e.x >= e.y && e.x >= e.z { 0 } else if e.y >= e.z { 1 } else { 2 }
    }
}
