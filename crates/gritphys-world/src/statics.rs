use gritphys_collision::{Bvh, CollisionEdges};
use gritphys_core::{PhysicsEngineConfig, Scalar, Vec3};
use gritphys_geom::{
    Aabb, BoundingSphere, CollisionQuadSphere, CollisionTriangleSphere, GeometryError, Plane,
};
use gritphys_materials::PhysicsMaterial;
use tracing::info;

/// Static level polygon; triangles and quads share the narrow-phase
/// surface.
#[derive(Copy, Clone, Debug)]
pub enum StaticPolygon {
    Triangle(CollisionTriangleSphere),
    Quad(CollisionQuadSphere),
}

impl StaticPolygon {
    pub fn plane(&self) -> &Plane {
        match self {
            StaticPolygon::Triangle(t) => &t.plane,
            StaticPolygon::Quad(q) => &q.plane,
        }
    }

    pub fn material(&self) -> PhysicsMaterial {
        match self {
            StaticPolygon::Triangle(t) => t.physics_material,
            StaticPolygon::Quad(q) => q.physics_material,
        }
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        match self {
            StaticPolygon::Triangle(t) => t.bounding_sphere,
            StaticPolygon::Quad(q) => q.bounding_sphere,
        }
    }

    pub fn aabb(&self) -> Aabb {
        match self {
            StaticPolygon::Triangle(t) => Aabb::from_points(&t.corners),
            StaticPolygon::Quad(q) => Aabb::from_points(&q.corners),
        }
    }

    pub fn closest_surface_point(&self, p: Vec3) -> Vec3 {
        match self {
            StaticPolygon::Triangle(t) => t.closest_surface_point(p),
            StaticPolygon::Quad(q) => q.closest_surface_point(p),
        }
    }

    pub fn intersect_segment(&self, a: Vec3, b: Vec3) -> Option<(Vec3, Scalar)> {
        match self {
            StaticPolygon::Triangle(t) => t.intersect_segment(a, b),
            StaticPolygon::Quad(q) => q.intersect_segment(a, b),
        }
    }

    pub fn contains_projection(&self, p: Vec3, tolerance: Scalar) -> bool {
        match self {
            StaticPolygon::Triangle(t) => t.contains_projection(p, tolerance),
            StaticPolygon::Quad(q) => q.contains_projection(p, tolerance),
        }
    }
}

/// Immutable level geometry: polygons plus the edge registry, both indexed
/// by BVHs built once at load.
pub struct StaticScene {
    polygons: Vec<StaticPolygon>,
    edges: CollisionEdges,
    polygon_bvh: Bvh<u32>,
    /// Ridge edges only, by index into `ridge_edges`.
    ridge_bvh: Bvh<u32>,
    ridge_edges: Vec<gritphys_geom::CollisionRidgeSphere>,
}

/// Accumulates level geometry, then freezes into a `StaticScene`.
#[derive(Default)]
pub struct StaticSceneBuilder {
    polygons: Vec<StaticPolygon>,
    triangles: Vec<([Vec3; 3], PhysicsMaterial)>,
}

impl StaticSceneBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn add_triangle(
        &mut self,
        corners: [Vec3; 3],
        material: PhysicsMaterial,
    ) -> Result<(), GeometryError> {
        let tri = CollisionTriangleSphere::try_new(corners, material)?;
        self.polygons.push(StaticPolygon::Triangle(tri));
        self.triangles.push((corners, material));
        Ok(())
    }

    pub fn add_quad(
        &mut self,
        corners: [Vec3; 4],
        material: PhysicsMaterial,
    ) -> Result<(), GeometryError> {
        let quad = CollisionQuadSphere::try_new(corners, material)?;
        self.polygons.push(StaticPolygon::Quad(quad));
        // edge classification tracks triangles; split the quad
        self.triangles.push(([corners[0], corners[1], corners[2]], material));
        self.triangles.push(([corners[0], corners[2], corners[3]], material));
        Ok(())
    }

    pub fn build(self, config: &PhysicsEngineConfig) -> Result<StaticScene, GeometryError> {
        let mut edges = CollisionEdges::new(config.max_min_cos_ridge);
        for (corners, material) in &self.triangles {
            edges.insert_triangle(*corners, *material, ())?;
        }
        let items: Vec<(Aabb, u32)> = self
            .polygons
            .iter()
            .enumerate()
            .map(|(i, p)| (p.aabb(), i as u32))
            .collect();
        let polygon_bvh = Bvh::build(items, config.bvh_max_size, config.bvh_levels);

        let ridge_edges: Vec<_> = edges.ridges().map(|(r, _)| *r).collect();
        let ridge_items: Vec<(Aabb, u32)> = ridge_edges
            .iter()
            .enumerate()
            .map(|(i, r)| (r.bounding_sphere.aabb(), i as u32))
            .collect();
        let ridge_bvh = Bvh::build(ridge_items, config.bvh_max_size, config.bvh_levels);

        info!(
            polygons = self.polygons.len(),
            edges = edges.len(),
            ridges = ridge_edges.len(),
            "static scene frozen"
        );
        Ok(StaticScene {
            polygons: self.polygons,
            edges,
            polygon_bvh,
            ridge_bvh,
            ridge_edges,
        })
    }
}

impl StaticScene {
    pub fn polygons(&self) -> &[StaticPolygon] { &self.polygons }
    pub fn edges(&self) -> &CollisionEdges { &self.edges }
    pub fn ridge_edges(&self) -> &[gritphys_geom::CollisionRidgeSphere] { &self.ridge_edges }

    pub fn polygons_near<F: FnMut(&StaticPolygon)>(&self, region: &Aabb, mut visit: F) {
        self.polygon_bvh
            .query_aabb(region, |_aabb, &i| visit(&self.polygons[i as usize]));
    }

    pub fn polygons_near_aabbs(&self, region: &Aabb) -> Vec<Aabb> {
        let mut out = Vec::new();
        self.polygon_bvh.query_aabb(region, |aabb, _| out.push(*aabb));
        out
    }

    pub fn ridges_near<F: FnMut(&gritphys_geom::CollisionRidgeSphere)>(
        &self,
        region: &Aabb,
        mut visit: F,
    ) {
        self.ridge_bvh
            .query_aabb(region, |_aabb, &i| visit(&self.ridge_edges[i as usize]));
    }
}
