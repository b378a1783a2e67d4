use gritphys_core::{Scalar, Vec3};
use gritphys_materials::PhysicsMaterial;

use crate::{
    closest_point_on_segment, BoundingSphere, GeometryError, Plane,
    distance::SEGMENT_LENGTH_TOLERANCE,
};

/// `min_cos` sentinel for an edge that has registered only one face; above
/// any valid cosine, so a single-face edge never classifies as a ridge.
pub const RIDGE_UNTRACKED_COS: Scalar = 2.0;

/// Line segment primitive (tire ray, bullet trace) with pruning sphere.
#[derive(Copy, Clone, Debug)]
pub struct CollisionLineSphere {
    pub line: [Vec3; 2],
    pub bounding_sphere: BoundingSphere,
    pub physics_material: PhysicsMaterial,
}

impl CollisionLineSphere {
    pub fn try_new(line: [Vec3; 2], physics_material: PhysicsMaterial) -> Result<Self, GeometryError> {
        if (line[1] - line[0]).length_squared() < SEGMENT_LENGTH_TOLERANCE {
            return Err(GeometryError::DegenerateSegment { a: line[0], b: line[1] });
        }
        Ok(Self {
            line,
            bounding_sphere: BoundingSphere::from_points(&line),
            physics_material,
        })
    }
}

/// Convex planar polygon primitive. `N = 3` for triangles, `N = 4` for
/// quads; both share the edge-plane point-in-polygon machinery.
#[derive(Copy, Clone, Debug)]
pub struct CollisionPolygonSphere<const N: usize> {
    pub corners: [Vec3; N],
    pub plane: Plane,
    /// Outward edge planes; a point is inside when every signed distance
    /// is non-positive.
    pub edge_planes: [Plane; N],
    pub bounding_sphere: BoundingSphere,
    pub physics_material: PhysicsMaterial,
}

pub type CollisionTriangleSphere = CollisionPolygonSphere<3>;
pub type CollisionQuadSphere = CollisionPolygonSphere<4>;

const POLYGON_PLANARITY_TOLERANCE: Scalar = 1.0e-3;

impl<const N: usize> CollisionPolygonSphere<N> {
    pub fn try_new(corners: [Vec3; N], physics_material: PhysicsMaterial) -> Result<Self, GeometryError> {
        for i in 0..N {
            let a = corners[i];
            let b = corners[(i + 1) % N];
            if (b - a).length_squared() < SEGMENT_LENGTH_TOLERANCE {
                return Err(GeometryError::DegenerateEdge { a, b, edge: i });
            }
        }
        // Newell's method; robust for any planar winding.
        let mut n = Vec3::ZERO;
        for i in 0..N {
            let a = corners[i];
            let b = corners[(i + 1) % N];
            n += Vec3::new(
                (a.y - b.y) * (a.z + b.z),
                (a.z - b.z) * (a.x + b.x),
                (a.x - b.x) * (a.y + b.y),
            );
        }
        let len = n.length();
        if len < 1.0e-9 {
            return Err(GeometryError::DegeneratePolygon);
        }
        let normal = n / len;
        let plane = Plane::from_normal_and_point(normal, corners[0]);
        for &c in corners.iter().skip(1) {
            if plane.signed_distance(c).abs() > POLYGON_PLANARITY_TOLERANCE {
                return Err(GeometryError::DegeneratePolygon);
            }
        }
        let edge_planes = core::array::from_fn(|i| {
            let a = corners[i];
            let b = corners[(i + 1) % N];
            Plane::from_normal_and_point((b - a).cross(normal).normalize(), a)
        });
        Ok(Self {
            corners,
            plane,
            edge_planes,
            bounding_sphere: BoundingSphere::from_points(&corners),
            physics_material,
        })
    }

    /// Whether the plane-projection of `p` falls inside, with `tolerance`
    /// loosening the edge planes outward.
    pub fn contains_projection(&self, p: Vec3, tolerance: Scalar) -> bool {
        self.edge_planes.iter().all(|ep| ep.signed_distance(p) <= tolerance)
    }

    /// Closest point of the polygon surface to `p`.
    pub fn closest_surface_point(&self, p: Vec3) -> Vec3 {
        let projected = p - self.plane.normal * self.plane.signed_distance(p);
        if self.contains_projection(projected, 0.0) {
            return projected;
        }
        let mut best = self.corners[0];
        let mut best_d2 = Scalar::INFINITY;
        for i in 0..N {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % N];
            // corner checks above guarantee non-degenerate edges
            if let Ok((q, _t)) = closest_point_on_segment(p, a, b) {
                let d2 = (p - q).length_squared();
                if d2 < best_d2 {
                    best_d2 = d2;
                    best = q;
                }
            }
        }
        best
    }

    /// Intersection of segment `[a, b]` with the polygon's surface.
    /// Front-face crossings only unless the material is two-sided; returns
    /// the hit point and the interpolation parameter.
    pub fn intersect_segment(&self, a: Vec3, b: Vec3) -> Option<(Vec3, Scalar)> {
        let da = self.plane.signed_distance(a);
        let db = self.plane.signed_distance(b);
        let crossing_front = da >= 0.0 && db < 0.0;
        let crossing_back = da < 0.0 && db >= 0.0 && self.physics_material.two_sided();
        if !crossing_front && !crossing_back {
            return None;
        }
        let t = da / (da - db);
        let hit = a + (b - a) * t;
        if self.contains_projection(hit, 0.0) {
            Some((hit, t))
        } else {
            None
        }
    }
}

/// Mesh edge with adjacent-face tracking. `min_cos` only ever decreases as
/// more faces register; once below the configured threshold the edge is a
/// ridge and gets explicit edge-collision handling.
#[derive(Copy, Clone, Debug)]
pub struct CollisionRidgeSphere {
    pub edge: [Vec3; 2],
    /// Representative adjacent-face normal (the first registered face).
    pub normal: Vec3,
    pub min_cos: Scalar,
    pub bounding_sphere: BoundingSphere,
    pub physics_material: PhysicsMaterial,
}

impl CollisionRidgeSphere {
    pub fn try_new(
        edge: [Vec3; 2],
        face_normal: Vec3,
        physics_material: PhysicsMaterial,
    ) -> Result<Self, GeometryError> {
        if (edge[1] - edge[0]).length_squared() < SEGMENT_LENGTH_TOLERANCE {
            return Err(GeometryError::DegenerateSegment { a: edge[0], b: edge[1] });
        }
        Ok(Self {
            edge,
            normal: face_normal,
            min_cos: RIDGE_UNTRACKED_COS,
            bounding_sphere: BoundingSphere::from_points(&edge),
            physics_material,
        })
    }

    /// Register another face sharing this edge; keeps the smaller cosine.
    pub fn register_face(&mut self, face_normal: Vec3) {
        let cos = self.normal.dot(face_normal).clamp(-1.0, 1.0);
        self.min_cos = self.min_cos.min(cos);
    }

    #[inline] pub fn is_ridge(&self, max_min_cos_ridge: Scalar) -> bool {
        self.min_cos < max_min_cos_ridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gritphys_core::vec3;

    fn mat() -> PhysicsMaterial { PhysicsMaterial::ATTR_COLLIDE }

    #[test] fn quad_contains_its_center() {
        let quad = CollisionQuadSphere::try_new(
            [
                vec3(0.0, 0.0, 0.0),
                vec3(2.0, 0.0, 0.0),
                vec3(2.0, 0.0, -2.0),
                vec3(0.0, 0.0, -2.0),
            ],
            mat(),
        )
        .unwrap();
        assert!(quad.contains_projection(vec3(1.0, 0.0, -1.0), 0.0));
        assert!(!quad.contains_projection(vec3(3.0, 0.0, -1.0), 0.0));
        assert!(quad.plane.normal.dot(Vec3::Y) > 0.99);
    }

    #[test] fn duplicate_corner_is_degenerate_edge() {
        let err = CollisionTriangleSphere::try_new(
            [Vec3::ZERO, Vec3::ZERO, vec3(1.0, 0.0, 0.0)],
            mat(),
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateEdge { edge: 0, .. }));
    }

    #[test] fn segment_hits_front_face_only() {
        let tri = CollisionTriangleSphere::try_new(
            [vec3(0.0, 0.0, 0.0), vec3(4.0, 0.0, 0.0), vec3(0.0, 0.0, -4.0)],
            mat(),
        )
        .unwrap();
        let down = tri.intersect_segment(vec3(1.0, 1.0, -1.0), vec3(1.0, -1.0, -1.0));
        assert!(down.is_some());
        let (hit, t) = down.unwrap();
        assert!((hit.y).abs() < 1e-6 && (t - 0.5).abs() < 1e-6);
        // back-face approach on a one-sided triangle
        assert!(tri.intersect_segment(vec3(1.0, -1.0, -1.0), vec3(1.0, 1.0, -1.0)).is_none());
    }

    #[test] fn two_sided_accepts_back_face() {
        let tri = CollisionTriangleSphere::try_new(
            [vec3(0.0, 0.0, 0.0), vec3(4.0, 0.0, 0.0), vec3(0.0, 0.0, -4.0)],
            mat() | PhysicsMaterial::ATTR_TWO_SIDED,
        )
        .unwrap();
        assert!(tri.intersect_segment(vec3(1.0, -1.0, -1.0), vec3(1.0, 1.0, -1.0)).is_some());
    }

    #[test] fn bounding_sphere_encloses_corners() {
        let tri = CollisionTriangleSphere::try_new(
            [vec3(0.0, 1.0, 0.0), vec3(3.0, 1.0, 0.0), vec3(0.0, 1.0, -3.0)],
            mat(),
        )
        .unwrap();
        for &c in &tri.corners {
            assert!(tri.bounding_sphere.contains_point(c));
        }
    }

    #[test] fn ridge_min_cos_decreases() {
        let mut r = CollisionRidgeSphere::try_new([Vec3::ZERO, Vec3::X], Vec3::Y, mat()).unwrap();
        assert!(!r.is_ridge(1.0));
        r.register_face(vec3(0.0, 0.0, 1.0)); // 90 degrees
        assert!((r.min_cos - 0.0).abs() < 1e-6);
        r.register_face(Vec3::Y); // coplanar face cannot raise it back
        assert!((r.min_cos - 0.0).abs() < 1e-6);
        assert!(r.is_ridge(0.71));
    }
}
