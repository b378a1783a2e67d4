use gritphys_core::{Scalar, Vec3};

/// Pacejka-shaped friction curve: rises steeply with slip, peaks, then
/// settles toward the sliding plateau. `steepness` controls how quickly the
/// peak is reached; longitudinal and lateral directions use independent
/// steepness values.
pub fn magic_formula(slip: Scalar, peak: Scalar, steepness: Scalar) -> Scalar {
    const SHAPE: Scalar = 1.65;
    peak * (SHAPE * (steepness * slip).atan()).sin()
}

/// 1-DOF spring-damper modeling vertical tire/suspension compression.
#[derive(Copy, Clone, Debug)]
pub struct ShockAbsorberParams {
    /// Spring rate (N/m).
    pub stiffness: Scalar,
    /// Damping (N.s/m).
    pub damping: Scalar,
    /// Maximum compression travel (m).
    pub travel: Scalar,
}

impl Default for ShockAbsorberParams {
    fn default() -> Self {
        Self { stiffness: 25_000.0, damping: 2_500.0, travel: 0.25 }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct ShockAbsorber {
    /// Compression from rest (m), clamped to `[0, travel]`.
    pub position: Scalar,
    pub velocity: Scalar,
}

impl ShockAbsorber {
    /// Advance the spring-damper under the substep's normal load (N).
    /// Unit sprung mass; the chassis mass is accounted for by the solver
    /// feeding impulses, not here. Damping is integrated implicitly so
    /// stiff absorbers stay stable at substep rates.
    pub fn advance(&mut self, params: &ShockAbsorberParams, load: Scalar, dt: Scalar) {
        let spring = load - params.stiffness * self.position;
        self.velocity = (self.velocity + spring * dt) / (1.0 + params.damping * dt);
        self.position += self.velocity * dt;
        if self.position < 0.0 {
            self.position = 0.0;
            self.velocity = self.velocity.max(0.0);
        } else if self.position > params.travel {
            self.position = params.travel;
            self.velocity = self.velocity.min(0.0);
        }
    }

    /// Force the absorber currently pushes back with (N).
    pub fn force(&self, params: &ShockAbsorberParams) -> Scalar {
        params.stiffness * self.position + params.damping * self.velocity
    }
}

/// Normal impulse resolved at a tire contact during the current substep;
/// cached on the tire so the friction model sees the actual load.
#[derive(Copy, Clone, Debug)]
pub struct NormalImpulse {
    pub lambda_total: Scalar,
    pub normal: Vec3,
}

#[derive(Copy, Clone, Debug)]
pub struct TireParams {
    /// Attach point in chassis space.
    pub local_position: Vec3,
    /// Suspension/down axis in chassis space (unit).
    pub axis: Vec3,
    pub radius: Scalar,
    pub shock: ShockAbsorberParams,
    /// Whether this wheel receives drive torque.
    pub driven: bool,
    /// Whether this wheel steers.
    pub steered: bool,
}

#[derive(Copy, Clone, Debug)]
pub struct Tire {
    pub params: TireParams,
    pub shock: ShockAbsorber,
    /// Wheel spin (rad/s).
    pub angular_velocity: Scalar,
    /// Contact state of the current substep; `None` while airborne.
    pub normal_impulse: Option<NormalImpulse>,
}

impl Tire {
    pub fn new(params: TireParams) -> Self {
        Self {
            params,
            shock: ShockAbsorber::default(),
            angular_velocity: 0.0,
            normal_impulse: None,
        }
    }

    /// Normal load (N) seen this substep, reconstructed from the cached
    /// impulse; zero while airborne.
    pub fn normal_load(&self, dt: Scalar) -> Scalar {
        self.normal_impulse
            .map(|ni| (ni.lambda_total / dt).max(0.0))
            .unwrap_or(0.0)
    }

    /// Longitudinal slip ratio at ground speed `v_long`.
    pub fn slip_ratio(&self, v_long: Scalar) -> Scalar {
        let rolling = self.angular_velocity * self.params.radius;
        let denom = v_long.abs().max(0.5);
        (rolling - v_long) / denom
    }
}
