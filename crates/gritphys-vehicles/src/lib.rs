pub mod tire;
pub mod engine;
pub mod vehicle;

pub use tire::{Tire, TireParams, NormalImpulse, ShockAbsorber, ShockAbsorberParams, magic_formula};
pub use engine::{EnginePower, EnginePowerError};
pub use vehicle::{RigidBodyVehicle, VehicleController};
