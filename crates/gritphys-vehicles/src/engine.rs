use gritphys_core::Scalar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnginePowerError {
    #[error("power curve needs at least two samples")]
    CurveTooShort,
    #[error("power curve angular velocities must be strictly increasing")]
    CurveNotSorted,
    #[error("at least one gear ratio is required")]
    NoGears,
    #[error("gear ratios must be positive")]
    NonPositiveGear,
}

/// Engine output power looked up on an interpolated curve, evaluated at the
/// current gear's scaled angular velocity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnginePower {
    /// `(engine angular velocity rad/s, power W)`, strictly increasing in
    /// angular velocity.
    curve: Vec<(Scalar, Scalar)>,
    /// Engine revs per wheel rev, highest (shortest) gear first.
    gear_ratios: Vec<Scalar>,
    gear: usize,
}

impl EnginePower {
    pub fn new(
        curve: Vec<(Scalar, Scalar)>,
        gear_ratios: Vec<Scalar>,
    ) -> Result<Self, EnginePowerError> {
        if curve.len() < 2 {
            return Err(EnginePowerError::CurveTooShort);
        }
        if curve.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(EnginePowerError::CurveNotSorted);
        }
        if gear_ratios.is_empty() {
            return Err(EnginePowerError::NoGears);
        }
        if gear_ratios.iter().any(|&g| g <= 0.0) {
            return Err(EnginePowerError::NonPositiveGear);
        }
        Ok(Self { curve, gear_ratios, gear: 0 })
    }

    #[inline] pub fn gear(&self) -> usize { self.gear }
    #[inline] pub fn gear_ratio(&self) -> Scalar { self.gear_ratios[self.gear] }

    /// Linear interpolation on the curve, clamped to its endpoints.
    fn curve_power(&self, engine_w: Scalar) -> Scalar {
        let first = self.curve[0];
        let last = self.curve[self.curve.len() - 1];
        if engine_w <= first.0 {
            return first.1;
        }
        if engine_w >= last.0 {
            return last.1;
        }
        for w in self.curve.windows(2) {
            let (w0, p0) = w[0];
            let (w1, p1) = w[1];
            if engine_w <= w1 {
                let t = (engine_w - w0) / (w1 - w0);
                return p0 + (p1 - p0) * t;
            }
        }
        last.1
    }

    /// Output power (W) at wheel angular velocity `w`, through the current
    /// gear.
    pub fn get_power(&self, w: Scalar) -> Scalar {
        self.curve_power(w.abs() * self.gear_ratio())
    }

    /// Greedily select the gear maximizing output power at the current
    /// wheel speed. A local heuristic, not a globally optimal shift
    /// schedule; ties keep the lower gear index.
    pub fn auto_set_gear(&mut self, w: Scalar) {
        let mut best = 0;
        let mut best_power = Scalar::NEG_INFINITY;
        for g in 0..self.gear_ratios.len() {
            let p = self.curve_power(w.abs() * self.gear_ratios[g]);
            if p > best_power {
                best_power = p;
                best = g;
            }
        }
        self.gear = best;
    }
}
