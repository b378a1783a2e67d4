use glam::Quat;
use gritphys_core::{Isometry, Mat3, Scalar, Vec3};
use gritphys_geom::MassProps;

/// Per-substep integration state. Every dynamic body cycles
/// `Unintegrated -> advance_time -> Integrated` once per substep; the
/// engine debug-asserts the cycle so a skipped or doubled integration is a
/// caller bug, not a silent drift source.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IntegrationState {
    Unintegrated,
    Integrated,
}

/// Pose and momentum of one rigid body. The orientation is a rotation
/// matrix re-orthonormalized after every step to bound drift; `mass ==
/// INFINITY` marks immovable bodies that never integrate.
#[derive(Clone, Debug)]
pub struct RigidBodyPulses {
    pub position: Vec3,
    pub rotation: Mat3,
    /// Linear velocity (m/s).
    pub v: Vec3,
    /// Angular velocity (rad/s, world frame).
    pub w: Vec3,
    pub mass: MassProps,
    force: Vec3,
    torque: Vec3,
    state: IntegrationState,
}

impl RigidBodyPulses {
    pub fn new(position: Vec3, rotation: Mat3, mass: MassProps) -> Self {
        Self {
            position,
            rotation,
            v: Vec3::ZERO,
            w: Vec3::ZERO,
            mass,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            state: IntegrationState::Unintegrated,
        }
    }

    pub fn stationary(position: Vec3) -> Self {
        Self::new(position, Mat3::IDENTITY, MassProps::infinite())
    }

    #[inline] pub fn is_immovable(&self) -> bool { self.mass.is_infinite() }
    #[inline] pub fn state(&self) -> IntegrationState { self.state }

    /// Absolute position; valid only between substeps (poses exposed to
    /// readers are always fully integrated).
    #[inline] pub fn abs_position(&self) -> Vec3 { self.position }

    pub fn abs_transformation(&self) -> Isometry {
        Isometry {
            pos: self.position,
            rot: Quat::from_mat3a(&self.rotation),
        }
    }

    /// World-frame inverse inertia: `R * I_local^-1 * R^T`.
    pub fn inv_inertia_world(&self) -> Mat3 {
        if self.is_immovable() {
            return Mat3::ZERO;
        }
        self.rotation * self.mass.inv_inertia * self.rotation.transpose()
    }

    /// Velocity of the material point at world position `p`.
    #[inline] pub fn velocity_at(&self, p: Vec3) -> Vec3 {
        self.v + self.w.cross(p - self.position)
    }

    pub fn apply_force(&mut self, f: Vec3) {
        if !self.is_immovable() {
            self.force += f;
        }
    }

    pub fn apply_torque(&mut self, tau: Vec3) {
        if !self.is_immovable() {
            self.torque += tau;
        }
    }

    /// Instantaneous impulse at world point `p`.
    pub fn apply_impulse_at(&mut self, j: Vec3, p: Vec3) {
        if self.is_immovable() {
            return;
        }
        self.v += j * self.mass.inv_mass;
        self.w += self.inv_inertia_world() * (p - self.position).cross(j);
    }

    pub fn apply_impulse(&mut self, j: Vec3) {
        if !self.is_immovable() {
            self.v += j * self.mass.inv_mass;
        }
    }

    /// Positional correction, already scaled for this body.
    pub fn apply_position_delta(&mut self, dp: Vec3) {
        if !self.is_immovable() {
            self.position += dp;
        }
    }

    pub fn begin_substep(&mut self) {
        self.state = IntegrationState::Unintegrated;
    }

    /// Semi-implicit Euler step: velocity from accumulated force/torque,
    /// then position, then a small-angle orientation increment followed by
    /// re-orthonormalization.
    pub fn advance_time(&mut self, dt: Scalar) {
        debug_assert_eq!(self.state, IntegrationState::Unintegrated, "double integration");
        self.state = IntegrationState::Integrated;
        if self.is_immovable() {
            self.force = Vec3::ZERO;
            self.torque = Vec3::ZERO;
            return;
        }
        self.v += self.force * (self.mass.inv_mass * dt);
        self.w += self.inv_inertia_world() * self.torque * dt;
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;

        self.position += self.v * dt;

        let dtheta = self.w * dt;
        let angle2 = dtheta.length_squared();
        if angle2 > 0.0 {
            // small-angle rotation increment composed on the left
            let dq = Quat::from_xyzw(dtheta.x * 0.5, dtheta.y * 0.5, dtheta.z * 0.5, 1.0)
                .normalize();
            self.rotation = Mat3::from_quat(dq) * self.rotation;
        }
        self.rotation = orthonormalized(self.rotation);
    }
}

/// Gram-Schmidt on the columns; keeps the matrix a rotation under repeated
/// small-angle composition.
pub fn orthonormalized(m: Mat3) -> Mat3 {
    let x = m.x_axis.normalize();
    let y = (m.y_axis - x * x.dot(m.y_axis)).normalize();
    let z = x.cross(y);
    Mat3::from_cols(x, y, z)
}
