use gritphys_core::{BodyHandle, Scalar, Vec3};
use gritphys_geom::{closest_point_on_segment, CollisionRidgeSphere, GeometryError};
use gritphys_materials::PhysicsMaterial;
use gritphys_vehicles::RigidBodyVehicle;

use crate::history::ContactParty;
use crate::statics::StaticPolygon;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ContactKind {
    Hull,
    /// Tire suspension ray; feeds the shock absorber and tire friction.
    TireLine { tire_index: usize },
    /// Sharp-edge contact that plain face collision would miss.
    Ridge,
}

/// One narrow-phase contact. The normal is unit length and pushes party
/// `a` away from party `b`.
#[derive(Copy, Clone, Debug)]
pub struct Contact {
    pub a: ContactParty,
    pub b: ContactParty,
    pub point: Vec3,
    pub normal: Vec3,
    pub depth: Scalar,
    pub kind: ContactKind,
    pub materials: (PhysicsMaterial, PhysicsMaterial),
}

/// Hull-vs-hull contact through the bodies' bounding spheres. Exact for
/// sphere hulls; bevel-box and capsule hulls are conservatively spherical
/// against other dynamic bodies (their analytic normals serve the static
/// narrow phase, where precision matters for tires).
pub fn hull_vs_hull(
    ha: BodyHandle,
    a: &RigidBodyVehicle,
    hb: BodyHandle,
    b: &RigidBodyVehicle,
) -> Option<Contact> {
    let ca = a.pulses.abs_position();
    let cb = b.pulses.abs_position();
    let (ra, rb) = (a.hull.bounding_radius(), b.hull.bounding_radius());
    let d = ca - cb;
    let rsum = ra + rb;
    let dist2 = d.length_squared();
    if dist2 > rsum * rsum {
        return None;
    }
    let dist = dist2.sqrt();
    let normal = if dist > 1.0e-6 { d / dist } else { Vec3::Y };
    Some(Contact {
        a: ContactParty::Body(ha),
        b: ContactParty::Body(hb),
        point: cb + normal * (rb - (rsum - dist) * 0.5),
        normal,
        depth: rsum - dist,
        kind: ContactKind::Hull,
        materials: (a.material, b.material),
    })
}

/// Dynamic hull against a static polygon. The closest surface point is
/// inverse-transformed into hull space so bevel-box and capsule hulls get
/// their exact signed distance and a continuously varying normal.
pub fn hull_vs_polygon(
    h: BodyHandle,
    body: &RigidBodyVehicle,
    poly: &StaticPolygon,
    overlap_tolerance: Scalar,
) -> Option<Contact> {
    let xf = body.pulses.abs_transformation();
    let c = body.pulses.abs_position();
    let q = poly.closest_surface_point(c);
    if (c - q).length() > body.hull.bounding_radius() + overlap_tolerance {
        return None;
    }
    let local_q = xf.inverse_transform_point(q);
    let sd = body.hull.signed_distance_local(local_q);
    if sd >= overlap_tolerance {
        return None;
    }
    // push direction: the hull's outward normal at the penetrating point,
    // reversed, so the body backs out of the surface
    let normal = -xf.transform_vector(body.hull.surface_normal_local(local_q));
    let plane_n = poly.plane().normal;
    // one-sided faces only push along their front side
    if !poly.material().two_sided() && normal.dot(plane_n) <= 0.0 {
        return None;
    }
    Some(Contact {
        a: ContactParty::Body(h),
        b: ContactParty::Static,
        point: q,
        normal,
        depth: (-sd).max(0.0),
        kind: ContactKind::Hull,
        materials: (body.material, poly.material()),
    })
}

/// Tire suspension ray against a static polygon. The contact depth is how
/// far the fully extended wheel would sink below the surface; the solver
/// turns it into a normal impulse and the shock absorber swallows it.
pub fn tire_line_vs_polygon(
    h: BodyHandle,
    body: &RigidBodyVehicle,
    tire_index: usize,
    poly: &StaticPolygon,
) -> Option<Contact> {
    let seg = body.tire_line_world(&body.tires[tire_index]);
    if !seg.bounding_sphere.intersects_sphere(&poly.bounding_sphere()) {
        return None;
    }
    let [p0, p1] = seg.line;
    let (hit, t) = poly.intersect_segment(p0, p1)?;
    let reach = (p1 - p0).length();
    let mut normal = poly.plane().normal;
    // normal must oppose the ray so it pushes the chassis up
    if normal.dot(p1 - p0) > 0.0 {
        normal = -normal;
    }
    Some(Contact {
        a: ContactParty::Body(h),
        b: ContactParty::Static,
        point: hit,
        normal,
        depth: (1.0 - t) * reach,
        kind: ContactKind::TireLine { tire_index },
        materials: (seg.physics_material, poly.material()),
    })
}

/// Static ridge edge against a dynamic hull. Only edges already classified
/// sharp reach this; smooth edges are covered by their faces.
pub fn ridge_vs_hull(
    ridge: &CollisionRidgeSphere,
    h: BodyHandle,
    body: &RigidBodyVehicle,
    overlap_tolerance: Scalar,
) -> Result<Option<Contact>, GeometryError> {
    let c = body.pulses.abs_position();
    let (q, _t) = closest_point_on_segment(c, ridge.edge[0], ridge.edge[1])?;
    let dir = c - q;
    let dist = dir.length();
    if dist > body.hull.bounding_radius() + overlap_tolerance {
        return Ok(None);
    }
    let xf = body.pulses.abs_transformation();
    let local_q = xf.inverse_transform_point(q);
    let sd = body.hull.signed_distance_local(local_q);
    if sd >= overlap_tolerance {
        return Ok(None);
    }
    let normal = if dist > 1.0e-6 {
        -xf.transform_vector(body.hull.surface_normal_local(local_q))
    } else {
        ridge.normal
    };
    Ok(Some(Contact {
        a: ContactParty::Body(h),
        b: ContactParty::Static,
        point: q,
        normal,
        depth: (-sd).max(0.0),
        kind: ContactKind::Ridge,
        materials: (body.material, ridge.physics_material),
    }))
}

/// A vehicle's own sharp hitbox edge crossing a static polygon;
/// edge-vs-face coverage for corners that face contacts miss.
pub fn vehicle_ridge_vs_polygon(
    h: BodyHandle,
    body: &RigidBodyVehicle,
    ridge: &CollisionRidgeSphere,
    poly: &StaticPolygon,
) -> Option<Contact> {
    let xf = body.pulses.abs_transformation();
    let e0 = xf.transform_point(ridge.edge[0]);
    let e1 = xf.transform_point(ridge.edge[1]);
    let (hit, _t) = poly.intersect_segment(e0, e1)?;
    let d0 = poly.plane().signed_distance(e0);
    let d1 = poly.plane().signed_distance(e1);
    let depth = (-d0.min(d1)).max(0.0);
    let mut normal = poly.plane().normal;
    if normal.dot(body.pulses.abs_position() - hit) < 0.0 {
        normal = -normal;
    }
    Some(Contact {
        a: ContactParty::Body(h),
        b: ContactParty::Static,
        point: hit,
        normal,
        depth,
        kind: ContactKind::Ridge,
        materials: (body.material, poly.material()),
    })
}
