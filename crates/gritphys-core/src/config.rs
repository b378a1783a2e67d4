use serde::{Deserialize, Serialize};
use crate::{Scalar, Vec3, vec3};

/// Process-wide tunables. Built once at startup and read-only afterwards;
/// every field round-trips through serde without unit conversion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhysicsEngineConfig {
    /// Logical frame interval in seconds.
    pub dt: Scalar,
    /// Collision/integration substeps per frame.
    pub nsubsteps: u32,
    /// Backlog beyond this (seconds) resets simulated time instead of
    /// fast-forwarding.
    pub max_residual_time: Scalar,
    pub gravity: [Scalar; 3],

    // Friction model
    pub stiction_coefficient: Scalar,
    pub friction_coefficient: Scalar,
    pub longitudinal_friction_steepness: Scalar,
    pub lateral_friction_steepness: Scalar,
    pub hand_brake_velocity: Scalar,
    pub no_slip: bool,
    pub avoid_burnout: bool,

    // Solver clamps
    pub max_penetration: Scalar,
    pub velocity_lambda_min: Scalar,
    pub overlap_tolerance: Scalar,

    // Spatial index
    pub bvh_levels: u32,
    pub bvh_max_size: usize,
    pub static_radius: Scalar,
    pub ncells: u32,
    pub dilation_radius: Scalar,

    // Ridge classification
    pub max_min_cos_ridge: Scalar,

    /// Bounded-iteration mode for terminating test runs; `None` = unlimited.
    pub nframes: Option<u64>,
}

impl Default for PhysicsEngineConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            nsubsteps: 8,
            max_residual_time: 0.5,
            gravity: [0.0, -9.81, 0.0],
            stiction_coefficient: 1.0,
            friction_coefficient: 0.8,
            longitudinal_friction_steepness: 5.0,
            lateral_friction_steepness: 7.0,
            hand_brake_velocity: 2.0,
            no_slip: false,
            avoid_burnout: true,
            max_penetration: 0.05,
            velocity_lambda_min: -100.0,
            overlap_tolerance: 0.002,
            bvh_levels: 10,
            bvh_max_size: 8,
            static_radius: 200.0,
            ncells: 32,
            dilation_radius: 1.0,
            max_min_cos_ridge: 0.71,
            nframes: None,
        }
    }
}

impl PhysicsEngineConfig {
    #[inline] pub fn gravity_vec(&self) -> Vec3 {
        vec3(self.gravity[0], self.gravity[1], self.gravity[2])
    }
    /// Substep interval in seconds.
    #[inline] pub fn dt_substep(&self) -> Scalar { self.dt / self.nsubsteps as Scalar }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn serde_round_trip_is_exact() {
        let mut cfg = PhysicsEngineConfig::default();
        cfg.stiction_coefficient = 1.2345678;
        cfg.velocity_lambda_min = -73.25;
        cfg.nframes = Some(600);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PhysicsEngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test] fn substep_interval() {
        let cfg = PhysicsEngineConfig { dt: 0.016, nsubsteps: 8, ..Default::default() };
        assert!((cfg.dt_substep() - 0.002).abs() < 1e-9);
    }
}
