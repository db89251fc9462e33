pub mod agent;
pub mod controller;
pub mod input;
pub mod kinematics;
pub mod types;

pub use agent::{Agent, DebugView, FieldInfo, TargetSource, Tick, MAX_TIME_DELTA};
pub use controller::RotationController;
pub use types::{ActuationCommand, VehiclePose};
