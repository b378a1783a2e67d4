pub mod scalar;
pub mod types;
pub mod ids;
pub mod time;
pub mod schedule;
pub mod config;

pub use scalar::Scalar;
pub use types::{Vec3, Mat3, Isometry, Velocity, vec3, iso};
pub use ids::{BodyHandle, ColliderId, TireId};
pub use time::StepStats;
pub use schedule::{StepStage, ScheduleRecorder};
pub use config::PhysicsEngineConfig;
pub use glam::Quat;
