pub mod pulses;
pub mod arena;

pub use pulses::{RigidBodyPulses, IntegrationState};
pub use arena::BodyArena;
