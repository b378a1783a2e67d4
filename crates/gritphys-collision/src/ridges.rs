use std::collections::BTreeMap;

use gritphys_core::{BodyHandle, Scalar, Vec3};
use gritphys_geom::{triangle_normal, CollisionRidgeSphere, GeometryError};
use gritphys_materials::PhysicsMaterial;
use tracing::debug;

/// Key quantization; endpoints within this resolution register as the same
/// edge regardless of float noise from neighboring triangles.
const KEY_SCALE: Scalar = 1.0e4;

type VertexKey = [i64; 3];
type EdgeKey = (VertexKey, VertexKey);

#[inline]
fn vertex_key(v: Vec3) -> VertexKey {
    [
        (v.x * KEY_SCALE).round() as i64,
        (v.y * KEY_SCALE).round() as i64,
        (v.z * KEY_SCALE).round() as i64,
    ]
}

/// Order-independent edge key: endpoint keys sorted.
#[inline]
fn edge_key(a: Vec3, b: Vec3) -> EdgeKey {
    let (ka, kb) = (vertex_key(a), vertex_key(b));
    if ka <= kb { (ka, kb) } else { (kb, ka) }
}

/// Edge registry deduplicating mesh edges and classifying them as sharp
/// ridges or smooth. The payload type distinguishes static-mesh edges
/// (`()`) from dynamic hitbox ridges owned by a vehicle (`BodyHandle`).
///
/// Invariant: an entry's `min_cos` is non-increasing under insertion, for
/// any insertion order; an edge shared only by near-coplanar faces
/// (cosine close to 1) never classifies as a ridge for thresholds <= 1.
pub struct RidgeMap<P> {
    edges: BTreeMap<EdgeKey, (CollisionRidgeSphere, P)>,
    max_min_cos_ridge: Scalar,
}

pub type CollisionEdges = RidgeMap<()>;
pub type CollisionRidgesRigidBody = RidgeMap<BodyHandle>;

impl<P: Copy> RidgeMap<P> {
    pub fn new(max_min_cos_ridge: Scalar) -> Self {
        Self { edges: BTreeMap::new(), max_min_cos_ridge }
    }

    pub fn len(&self) -> usize { self.edges.len() }
    pub fn is_empty(&self) -> bool { self.edges.is_empty() }
    pub fn clear(&mut self) { self.edges.clear(); }

    /// Register all three edges of a triangle. The triangle is validated
    /// before any mutation, so a degenerate triangle leaves the registry
    /// untouched.
    pub fn insert_triangle(
        &mut self,
        vertices: [Vec3; 3],
        material: PhysicsMaterial,
        payload: P,
    ) -> Result<(), GeometryError> {
        let normal = triangle_normal(vertices)?;
        let [a, b, c] = vertices;
        for (p, q) in [(a, b), (b, c), (c, a)] {
            let key = edge_key(p, q);
            match self.edges.get_mut(&key) {
                Some((ridge, _)) => ridge.register_face(normal),
                None => {
                    let ridge = CollisionRidgeSphere::try_new([p, q], normal, material)?;
                    self.edges.insert(key, (ridge, payload));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, a: Vec3, b: Vec3) -> Option<&CollisionRidgeSphere> {
        self.edges.get(&edge_key(a, b)).map(|(r, _)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CollisionRidgeSphere, &P)> {
        self.edges.values().map(|(r, p)| (r, p))
    }

    /// Only the edges classified sharp under the configured threshold.
    pub fn ridges(&self) -> impl Iterator<Item = (&CollisionRidgeSphere, &P)> {
        let threshold = self.max_min_cos_ridge;
        self.edges
            .values()
            .filter(move |(r, _)| r.is_ridge(threshold))
            .map(|(r, p)| (r, p))
    }

    pub fn ridge_count(&self) -> usize {
        self.ridges().count()
    }

    /// Drop every edge whose payload fails the predicate; used when a
    /// vehicle despawns and its hitbox ridges must go with it.
    pub fn retain<F: FnMut(&P) -> bool>(&mut self, mut keep: F) {
        let before = self.edges.len();
        self.edges.retain(|_k, (_r, p)| keep(p));
        if self.edges.len() != before {
            debug!(removed = before - self.edges.len(), "ridge payloads retired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gritphys_core::vec3;

    const THRESHOLD: Scalar = 0.71;

    fn mat() -> PhysicsMaterial { PhysicsMaterial::ATTR_COLLIDE }

    // two triangles folded along the shared X-axis edge, 90 degrees apart
    fn fold_pair() -> ([Vec3; 3], [Vec3; 3]) {
        (
            [vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0)],
            [vec3(0.0, 0.0, 0.0), vec3(0.0, -1.0, 0.0), vec3(1.0, 0.0, 0.0)],
        )
    }

    #[test] fn shared_edge_min_cos_is_order_independent() {
        let (t0, t1) = fold_pair();
        let mut fwd = CollisionEdges::new(THRESHOLD);
        fwd.insert_triangle(t0, mat(), ()).unwrap();
        fwd.insert_triangle(t1, mat(), ()).unwrap();
        let mut rev = CollisionEdges::new(THRESHOLD);
        rev.insert_triangle(t1, mat(), ()).unwrap();
        rev.insert_triangle(t0, mat(), ()).unwrap();
        let a = fwd.get(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0)).unwrap();
        let b = rev.get(vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, 0.0)).unwrap();
        assert!((a.min_cos - b.min_cos).abs() < 1e-6);
        assert!(a.is_ridge(THRESHOLD));
    }

    #[test] fn min_cos_never_increases() {
        let (t0, t1) = fold_pair();
        let mut m = CollisionEdges::new(THRESHOLD);
        m.insert_triangle(t0, mat(), ()).unwrap();
        let c0 = m.get(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0)).unwrap().min_cos;
        m.insert_triangle(t1, mat(), ()).unwrap();
        let c1 = m.get(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0)).unwrap().min_cos;
        assert!(c1 <= c0);
        // a third coplanar face cannot raise it
        m.insert_triangle(
            [vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(0.5, 0.0, -2.0)],
            mat(),
            (),
        )
        .unwrap();
        let c2 = m.get(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0)).unwrap().min_cos;
        assert!(c2 <= c1);
    }

    #[test] fn coplanar_edge_is_never_a_ridge() {
        let mut m = CollisionEdges::new(1.0);
        m.insert_triangle(
            [vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0)],
            mat(),
            (),
        )
        .unwrap();
        m.insert_triangle(
            [vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0), vec3(1.0, 0.0, 0.0)],
            mat(),
            (),
        )
        .unwrap();
        let e = m.get(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0)).unwrap();
        assert!(!e.is_ridge(1.0));
        assert_eq!(m.ridge_count(), 0);
    }

    #[test] fn degenerate_triangle_leaves_registry_unchanged() {
        let mut m = CollisionEdges::new(THRESHOLD);
        m.insert_triangle(
            [vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0)],
            mat(),
            (),
        )
        .unwrap();
        let before = m.len();
        let dup = vec3(2.0, 0.0, 0.0);
        let err = m.insert_triangle([dup, dup, vec3(3.0, 0.0, 0.0)], mat(), ()).unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateEdge { edge: 0, .. }));
        assert_eq!(m.len(), before);
        for (r, _) in m.iter() {
            assert!(r.min_cos.is_finite() || r.min_cos == gritphys_geom::RIDGE_UNTRACKED_COS);
            assert!(!r.normal.x.is_nan());
        }
    }

    #[test] fn vehicle_ridges_retire_with_their_body() {
        let h0 = BodyHandle { index: 0, generation: 1 };
        let h1 = BodyHandle { index: 1, generation: 1 };
        let mut m = CollisionRidgesRigidBody::new(THRESHOLD);
        m.insert_triangle(
            [vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0)],
            mat(),
            h0,
        )
        .unwrap();
        m.insert_triangle(
            [vec3(5.0, 0.0, 0.0), vec3(6.0, 0.0, 0.0), vec3(5.0, 1.0, 0.0)],
            mat(),
            h1,
        )
        .unwrap();
        m.retain(|&p| p != h0);
        assert!(m.iter().all(|(_r, &p)| p == h1));
    }
}
