use gritphys_core::{Scalar, Vec3};
use crate::GeometryError;

pub const SEGMENT_LENGTH_TOLERANCE: Scalar = 1.0e-12;

/// Closest point on segment `[a, b]` to `p`, with the clamped parameter.
/// Fails on segments shorter than the length tolerance instead of dividing
/// by a vanishing denominator.
pub fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Result<(Vec3, Scalar), GeometryError> {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 < SEGMENT_LENGTH_TOLERANCE {
        return Err(GeometryError::DegenerateSegment { a, b });
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    Ok((a + ab * t, t))
}

/// Projection of `p` onto the ray `origin + t * dir`, with `t` clamped to
/// `[0, t_max]`. `dir` need not be unit length.
pub fn closest_point_on_ray(p: Vec3, origin: Vec3, dir: Vec3, t_max: Scalar) -> (Vec3, Scalar) {
    let len2 = dir.length_squared();
    if len2 < SEGMENT_LENGTH_TOLERANCE {
        return (origin, 0.0);
    }
    let t = ((p - origin).dot(dir) / len2).clamp(0.0, t_max);
    (origin + dir * t, t)
}

/// Right-handed triangle normal. Duplicate or collinear vertices fail with
/// the triangle identified.
pub fn triangle_normal(vertices: [Vec3; 3]) -> Result<Vec3, GeometryError> {
    let [a, b, c] = vertices;
    for (i, (p, q)) in [(a, b), (b, c), (c, a)].into_iter().enumerate() {
        if (q - p).length_squared() < SEGMENT_LENGTH_TOLERANCE {
            return Err(GeometryError::DegenerateEdge { a: p, b: q, edge: i });
        }
    }
    let n = (b - a).cross(c - a);
    let len = n.length();
    if len < 1.0e-9 {
        return Err(GeometryError::DegenerateTriangle { vertices });
    }
    Ok(n / len)
}

/// Whether the plane-projection of `p` falls inside the triangle, tested
/// against the winding implied by `expected_normal`. A triangle wound
/// left-handed for that normal is an error, never a silent misclassify.
pub fn point_in_triangle(
    p: Vec3,
    vertices: [Vec3; 3],
    expected_normal: Vec3,
) -> Result<bool, GeometryError> {
    let n = triangle_normal(vertices)?;
    if n.dot(expected_normal) <= 0.0 {
        return Err(GeometryError::LeftHandedTriangle { vertices });
    }
    let [a, b, c] = vertices;
    for (v0, v1) in [(a, b), (b, c), (c, a)] {
        // outward edge plane: contains the edge, spans the normal axis
        let edge_n = (v1 - v0).cross(n);
        if edge_n.dot(p - v0) > 0.0 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Distance from `p` to the closest point of the (solid) triangle, plus
/// that closest point.
pub fn distance_point_triangle(
    p: Vec3,
    vertices: [Vec3; 3],
    expected_normal: Vec3,
) -> Result<(Scalar, Vec3), GeometryError> {
    let n = triangle_normal(vertices)?;
    if n.dot(expected_normal) <= 0.0 {
        return Err(GeometryError::LeftHandedTriangle { vertices });
    }
    let [a, b, c] = vertices;
    let height = n.dot(p - a);
    let projected = p - n * height;
    if point_in_triangle(projected, vertices, n)? {
        return Ok((height.abs(), projected));
    }
    let mut best: Option<(Scalar, Vec3)> = None;
    for (v0, v1) in [(a, b), (b, c), (c, a)] {
        let (q, _t) = closest_point_on_segment(p, v0, v1)?;
        let d2 = (p - q).length_squared();
        if best.map_or(true, |(bd, _)| d2 < bd) {
            best = Some((d2, q));
        }
    }
    let (d2, q) = best.unwrap();
    Ok((d2.sqrt(), q))
}
