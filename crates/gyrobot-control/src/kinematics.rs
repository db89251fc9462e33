use crate::types::{ActuationCommand, VehiclePose};
use glam::{DMat3, DQuat, DVec3};

/// Angular speed cap (rad/s) of the stand-in vehicle.
pub const MAX_ANGULAR_SPEED: f64 = 5.5;

/// Rotation-only stand-in for a vehicle: a command maps straight to body-frame
/// angular acceleration, and angular speed is capped. There is no translation,
/// drag or contact; it exists to close the loop when no real host is attached.
#[derive(Debug, Clone)]
pub struct RotationalKinematics {
    orientation: DQuat,
    /// Body-frame angular velocity (rad/s).
    angular_velocity: DVec3,
    authority: DVec3,
}

impl RotationalKinematics {
    pub fn new(orientation: DQuat, authority: DVec3) -> Self {
        Self {
            orientation: orientation.normalize(),
            angular_velocity: DVec3::ZERO,
            authority,
        }
    }

    /// Advance by `dt` seconds under `command`.
    pub fn apply(&mut self, command: &ActuationCommand, dt: f64) {
        let accel = command.torque().clamp(DVec3::NEG_ONE, DVec3::ONE) * self.authority;
        self.angular_velocity =
            (self.angular_velocity + accel * dt).clamp_length_max(MAX_ANGULAR_SPEED);
        self.orientation =
            (self.orientation * DQuat::from_scaled_axis(self.angular_velocity * dt)).normalize();
    }

    /// Pose as a host would report it, pinned at `position`.
    pub fn pose(&self, position: DVec3) -> VehiclePose {
        VehiclePose {
            position,
            orientation: DMat3::from_quat(self.orientation),
            angular_velocity: self.orientation * self.angular_velocity,
        }
    }
}
