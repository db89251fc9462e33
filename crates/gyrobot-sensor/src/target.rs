use crate::types::{Orientation, TargetOrientation};
use glam::DQuat;

/// Turn the sensor's current frame into a vehicle-frame target by applying
/// the calibration heading offset about world Z.
pub fn synthesize(sensor: &Orientation, relative_yaw: f64) -> TargetOrientation {
    sensor
        .rotated(DQuat::from_rotation_z(relative_yaw))
        .orthonormalized()
        .into()
}
