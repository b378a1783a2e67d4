pub mod bvh;
pub mod grid;
pub mod ridges;

pub use bvh::Bvh;
pub use grid::DynamicGrid;
pub use ridges::{RidgeMap, CollisionEdges, CollisionRidgesRigidBody};
