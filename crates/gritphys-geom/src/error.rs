use gritphys_core::Vec3;
use thiserror::Error;

/// Geometric degeneracies. These abort a single contact candidate and name
/// the offending feature; callers skip the candidate and continue.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("segment {a:?} -> {b:?} is shorter than the length tolerance")]
    DegenerateSegment { a: Vec3, b: Vec3 },

    #[error("polygon edge {edge} from {a:?} to {b:?} has coincident endpoints")]
    DegenerateEdge { a: Vec3, b: Vec3, edge: usize },

    #[error("triangle {vertices:?} has collinear or duplicate vertices")]
    DegenerateTriangle { vertices: [Vec3; 3] },

    #[error("triangle {vertices:?} is wound left-handed for its plane")]
    LeftHandedTriangle { vertices: [Vec3; 3] },

    #[error("polygon normal is below the length tolerance")]
    DegeneratePolygon,
}
