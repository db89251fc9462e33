use glam::{DMat3, DVec3};

/// Vehicle state as reported by the host each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehiclePose {
    /// World position.
    pub position: DVec3,
    /// Rotation matrix with columns forward, left, up (world coordinates).
    pub orientation: DMat3,
    /// World-frame angular velocity (rad/s).
    pub angular_velocity: DVec3,
}

impl VehiclePose {
    pub fn forward(&self) -> DVec3 {
        self.orientation.x_axis
    }

    pub fn up(&self) -> DVec3 {
        self.orientation.z_axis
    }
}

/// Per-tick output handed back to the host.
///
/// Rotational commands are normalized to `[-1, 1]` and act about the
/// vehicle's own axes with the right-hand rule: `roll` about forward,
/// `pitch` about left, `yaw` about up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActuationCommand {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub boost: bool,
    pub jump: bool,
}

impl ActuationCommand {
    /// Rotational part as (roll, pitch, yaw).
    pub fn torque(&self) -> DVec3 {
        DVec3::new(self.roll, self.pitch, self.yaw)
    }
}
