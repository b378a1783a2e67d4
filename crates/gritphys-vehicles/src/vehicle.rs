use std::collections::BTreeSet;

use gritphys_collision::CollisionRidgesRigidBody;
use gritphys_core::{BodyHandle, Scalar};
use gritphys_dynamics::RigidBodyPulses;
use gritphys_geom::{BoundingSphere, CollisionLineSphere, Hull};
use gritphys_materials::PhysicsMaterial;

use crate::{EnginePower, Tire};

/// Driver input for one tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct VehicleController {
    /// Throttle in `[0, 1]`.
    pub throttle: Scalar,
    /// Steering angle (radians, + steers left around the up axis).
    pub steer: Scalar,
    /// Brake in `[0, 1]`.
    pub brake: Scalar,
    pub hand_brake: bool,
}

/// A simulated body: pulse state, a simplified collision hull, optional
/// tires/engine for driven vehicles, and per-vehicle hitbox ridges. Plain
/// static geometry and projectiles are vehicles with no tires.
pub struct RigidBodyVehicle {
    pub pulses: RigidBodyPulses,
    pub hull: Hull,
    pub material: PhysicsMaterial,
    pub tires: Vec<Tire>,
    pub engine: Option<EnginePower>,
    pub controller: VehicleController,
    /// Sharp hitbox edges owned by this vehicle; retired with it.
    pub hitbox_ridges: CollisionRidgesRigidBody,
    /// Bodies this one never collides with (trailer hitches, own bullets).
    pub non_colliders: BTreeSet<BodyHandle>,
}

impl RigidBodyVehicle {
    pub fn new(pulses: RigidBodyPulses, hull: Hull, material: PhysicsMaterial) -> Self {
        Self {
            pulses,
            hull,
            material,
            tires: Vec::new(),
            engine: None,
            controller: VehicleController::default(),
            hitbox_ridges: CollisionRidgesRigidBody::new(1.0),
            non_colliders: BTreeSet::new(),
        }
    }

    pub fn with_tires(mut self, tires: Vec<Tire>, engine: EnginePower) -> Self {
        self.tires = tires;
        self.engine = Some(engine);
        self
    }

    #[inline] pub fn is_immovable(&self) -> bool { self.pulses.is_immovable() }

    pub fn bounding_radius(&self) -> Scalar {
        let mut r = self.hull.bounding_radius();
        for t in &self.tires {
            r = r.max(t.params.local_position.length() + t.params.shock.travel + t.params.radius);
        }
        r
    }

    /// Tire suspension ray in world space: attach point to fully extended
    /// wheel bottom, as the `OBJ_TIRE_LINE` segment primitive the narrow
    /// phase intersects with level polygons.
    pub fn tire_line_world(&self, tire: &Tire) -> CollisionLineSphere {
        let xf = self.pulses.abs_transformation();
        let p0 = xf.transform_point(tire.params.local_position);
        let dir = xf.transform_vector(tire.params.axis);
        let reach = tire.params.shock.travel + tire.params.radius;
        let line = [p0, p0 + dir * reach];
        CollisionLineSphere {
            line,
            bounding_sphere: BoundingSphere::from_points(&line),
            physics_material: self.material | PhysicsMaterial::OBJ_TIRE_LINE,
        }
    }

    /// Clear per-substep contact caches before a new substep.
    pub fn begin_substep(&mut self) {
        self.pulses.begin_substep();
        for t in &mut self.tires {
            t.normal_impulse = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gritphys_core::{vec3, Mat3};
    use gritphys_geom::MassProps;
    use crate::{TireParams, ShockAbsorberParams};

    fn car() -> RigidBodyVehicle {
        let pulses = RigidBodyPulses::new(
            vec3(0.0, 1.0, 0.0),
            Mat3::IDENTITY,
            MassProps::cuboid(vec3(1.7, 0.25, 0.9), 600.0),
        );
        let hull = Hull::BevelBox(gritphys_geom::BevelBox::new(vec3(1.7, 0.25, 0.9), 0.1));
        let mut v = RigidBodyVehicle::new(
            pulses,
            hull,
            PhysicsMaterial::ATTR_COLLIDE
                | PhysicsMaterial::OBJ_CHASSIS
                | PhysicsMaterial::SURFACE_BASE_METAL,
        );
        v.tires.push(Tire::new(TireParams {
            local_position: vec3(-1.3, -0.2, 0.8),
            axis: -gritphys_core::Vec3::Y,
            radius: 0.32,
            shock: ShockAbsorberParams::default(),
            driven: true,
            steered: false,
        }));
        v
    }

    #[test] fn tire_line_points_down_from_attach() {
        let v = car();
        let seg = v.tire_line_world(&v.tires[0]);
        let [a, b] = seg.line;
        assert!((a.y - 0.8).abs() < 1e-5);
        assert!(b.y < a.y);
        assert!(((a.y - b.y) - (0.25 + 0.32)).abs() < 1e-5);
        assert!(seg.physics_material.contains(PhysicsMaterial::OBJ_TIRE_LINE));
        assert!(seg.bounding_sphere.contains_point(a));
        assert!(seg.bounding_sphere.contains_point(b));
    }

    #[test] fn bounding_radius_covers_tires() {
        let v = car();
        let wheel_reach = v.tires[0].params.local_position.length() + 0.25 + 0.32;
        assert!(v.bounding_radius() >= wheel_reach);
    }

    #[test] fn begin_substep_clears_tire_contacts() {
        let mut v = car();
        v.tires[0].normal_impulse = Some(crate::NormalImpulse {
            lambda_total: 10.0,
            normal: gritphys_core::Vec3::Y,
        });
        v.begin_substep();
        assert!(v.tires[0].normal_impulse.is_none());
    }
}
