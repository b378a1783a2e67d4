pub mod error;
pub mod aabb;
pub mod sphere;
pub mod plane;
pub mod distance;
pub mod primitives;
pub mod hull;
pub mod sweep;
pub mod mass;

pub use error::GeometryError;
pub use aabb::Aabb;
pub use sphere::BoundingSphere;
pub use plane::{Plane, plane_plane_intersection};
pub use distance::{
    closest_point_on_segment, closest_point_on_ray, distance_point_triangle,
    point_in_triangle, triangle_normal,
};
pub use primitives::{
    CollisionLineSphere, CollisionPolygonSphere, CollisionRidgeSphere,
    CollisionTriangleSphere, CollisionQuadSphere, RIDGE_UNTRACKED_COS,
};
pub use hull::{BevelBox, CapsuleHull, Hull};
pub use sweep::{ray_aabb, sweep_sphere_aabb};
pub use mass::MassProps;
