use gritphys_core::{Scalar, Vec3, Isometry};

/// Axis-aligned box with rounded edges of the given radius, used as a
/// simplified chassis/wheel hull. The outward normal varies continuously
/// across face, edge, and corner regions, so tire contacts never see a
/// normal jump when sliding over an edge.
#[derive(Copy, Clone, Debug)]
pub struct BevelBox {
    pub half_extents: Vec3,
    pub radius: Scalar,
}

impl BevelBox {
    pub fn new(half_extents: Vec3, radius: Scalar) -> Self {
        Self { half_extents, radius }
    }

    /// The sharp inner core; the full hull is this core dilated by `radius`.
    #[inline] fn core(&self) -> Vec3 {
        (self.half_extents - Vec3::splat(self.radius)).max(Vec3::ZERO)
    }

    /// Signed distance from `p` (hull-local) to the surface.
    pub fn signed_distance(&self, p: Vec3) -> Scalar {
        let q = p.clamp(-self.core(), self.core());
        (p - q).length() - self.radius
    }

    /// Outward unit normal at the region `p` falls into: the face normal
    /// inside a face region, a rounded blend across edges and corners.
    pub fn surface_normal(&self, p: Vec3) -> Vec3 {
        let q = p.clamp(-self.core(), self.core());
        let d = p - q;
        let len = d.length();
        if len > 1.0e-9 {
            return d / len;
        }
        // interior point: dominant penetration axis
        let core = self.core();
        let excess = core - p.abs();
        if excess.x <= excess.y && excess.x <= excess.z {
            Vec3::new(p.x.signum(), 0.0, 0.0)
        } else if excess.y <= excess.z {
            Vec3::new(0.0, p.y.signum(), 0.0)
        } else {
            Vec3::new(0.0, 0.0, p.z.signum())
        }
    }

    #[inline] pub fn bounding_radius(&self) -> Scalar {
        self.core().length() + self.radius
    }
}

/// Capsule hull: segment of half-length `half_length` along local Y with
/// the given radius. Queries inverse-transform into capsule space, clamp
/// along the axis, and rotate the resulting normal back out.
#[derive(Copy, Clone, Debug)]
pub struct CapsuleHull {
    pub half_length: Scalar,
    pub radius: Scalar,
}

impl CapsuleHull {
    pub fn new(half_length: Scalar, radius: Scalar) -> Self {
        Self { half_length, radius }
    }

    fn axis_point(&self, local: Vec3) -> Vec3 {
        Vec3::new(0.0, local.y.clamp(-self.half_length, self.half_length), 0.0)
    }

    pub fn signed_distance_local(&self, local: Vec3) -> Scalar {
        (local - self.axis_point(local)).length() - self.radius
    }

    pub fn surface_normal_local(&self, local: Vec3) -> Vec3 {
        let d = local - self.axis_point(local);
        let len = d.length();
        if len > 1.0e-9 { d / len } else { Vec3::X }
    }

    pub fn surface_normal_world(&self, xf: &Isometry, p_world: Vec3) -> Vec3 {
        let local = xf.inverse_transform_point(p_world);
        xf.transform_vector(self.surface_normal_local(local))
    }

    #[inline] pub fn bounding_radius(&self) -> Scalar {
        self.half_length + self.radius
    }
}

/// Simplified collision hull attached to a dynamic body.
#[derive(Copy, Clone, Debug)]
pub enum Hull {
    Sphere { radius: Scalar },
    BevelBox(BevelBox),
    Capsule(CapsuleHull),
}

impl Hull {
    pub fn bounding_radius(&self) -> Scalar {
        match *self {
            Hull::Sphere { radius } => radius,
            Hull::BevelBox(b) => b.bounding_radius(),
            Hull::Capsule(c) => c.bounding_radius(),
        }
    }

    /// Signed distance from a hull-local point to the hull surface.
    pub fn signed_distance_local(&self, local: Vec3) -> Scalar {
        match *self {
            Hull::Sphere { radius } => local.length() - radius,
            Hull::BevelBox(b) => b.signed_distance(local),
            Hull::Capsule(c) => c.signed_distance_local(local),
        }
    }

    /// Outward normal at a hull-local point.
    pub fn surface_normal_local(&self, local: Vec3) -> Vec3 {
        match *self {
            Hull::Sphere { .. } => {
                let len = local.length();
                if len > 1.0e-9 { local / len } else { Vec3::Y }
            }
            Hull::BevelBox(b) => b.surface_normal(local),
            Hull::Capsule(c) => c.surface_normal_local(local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gritphys_core::{vec3, iso};
    use glam::Quat;

    #[test] fn bevel_box_face_region() {
        let b = BevelBox::new(vec3(1.0, 0.5, 2.0), 0.1);
        let n = b.surface_normal(vec3(1.5, 0.0, 0.0));
        assert_relative_eq!(n.x, 1.0, epsilon = 1e-6);
    }

    #[test] fn bevel_box_corner_region_blends() {
        let b = BevelBox::new(Vec3::splat(1.0), 0.1);
        let n = b.surface_normal(vec3(2.0, 2.0, 2.0));
        // corner normal points along the diagonal
        assert_relative_eq!(n.x, n.y, epsilon = 1e-6);
        assert_relative_eq!(n.y, n.z, epsilon = 1e-6);
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-6);
    }

    #[test] fn bevel_box_signed_distance_on_surface() {
        let b = BevelBox::new(Vec3::splat(1.0), 0.2);
        assert_relative_eq!(b.signed_distance(vec3(1.0, 0.0, 0.0)), 0.0, epsilon = 1e-6);
        assert!(b.signed_distance(Vec3::ZERO) < 0.0);
    }

    #[test] fn capsule_clamps_along_axis() {
        let c = CapsuleHull::new(1.0, 0.25);
        // beyond the cap: normal radiates from the segment endpoint
        let n = c.surface_normal_local(vec3(0.0, 2.0, 0.0));
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-6);
        // beside the shaft: radial
        let n = c.surface_normal_local(vec3(0.5, 0.3, 0.0));
        assert_relative_eq!(n.x, 1.0, epsilon = 1e-6);
    }

    #[test] fn capsule_world_normal_rotates_back() {
        let c = CapsuleHull::new(1.0, 0.25);
        // capsule axis rotated to world X
        let xf = iso(Vec3::ZERO, Quat::from_rotation_z(-core::f32::consts::FRAC_PI_2));
        let n = c.surface_normal_world(&xf, vec3(3.0, 0.0, 0.0));
        assert_relative_eq!(n.x, 1.0, epsilon = 1e-5);
    }
}
