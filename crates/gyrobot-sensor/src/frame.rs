use crate::types::Orientation;
use glam::{DQuat, DVec3};

/// Turn device Euler angles (radians) into an orthonormal frame.
///
/// The device yaw is negated first. The rotation is then composed as yaw
/// about world Z, pitch (nose up) and roll, so that
/// `forward = (cos p cos y, cos p sin y, sin p)`.
pub fn decode(pitch: f64, yaw: f64, roll: f64) -> Orientation {
    let yaw = -yaw;
    let rotation =
        DQuat::from_rotation_z(yaw) * DQuat::from_rotation_y(-pitch) * DQuat::from_rotation_x(-roll);

    Orientation {
        forward: rotation * DVec3::X,
        up: rotation * DVec3::Z,
    }
}
