use glam::DVec3;

/// Reference pair captured at the last accepted reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationState {
    /// Vehicle forward at the instant of the reset.
    pub vehicle_forward: DVec3,
    /// Sensor forward at the instant of the reset.
    pub sensor_forward: DVec3,
    /// Counter of the accepted reset. `None` until the first one.
    pub last_counter: Option<u64>,
    /// Heading offset from sensor frame to vehicle frame (radians).
    pub relative_yaw: f64,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self {
            vehicle_forward: DVec3::ZERO,
            sensor_forward: DVec3::ZERO,
            last_counter: None,
            relative_yaw: 0.0,
        }
    }
}

/// Heading of the vehicle minus heading of the sensor, both measured in the
/// world XY plane.
pub fn relative_yaw(vehicle_forward: DVec3, sensor_forward: DVec3) -> f64 {
    vehicle_forward.y.atan2(vehicle_forward.x) - sensor_forward.y.atan2(sensor_forward.x)
}

/// Owns the calibration reference and guards it with the reset counter.
///
/// Resets can be retransmitted or arrive out of order, so only a strictly
/// larger counter replaces the reference.
#[derive(Debug, Default)]
pub struct CalibrationTracker {
    state: CalibrationState,
}

impl CalibrationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the reset was accepted.
    pub fn reset(&mut self, counter: u64, vehicle_forward: DVec3, sensor_forward: DVec3) -> bool {
        if self.state.last_counter.is_some_and(|last| counter <= last) {
            return false;
        }

        self.state = CalibrationState {
            vehicle_forward,
            sensor_forward,
            last_counter: Some(counter),
            relative_yaw: relative_yaw(vehicle_forward, sensor_forward),
        };
        true
    }

    /// Forget the last counter so that the next reset is accepted whatever
    /// its value. The current reference stays in effect until then.
    pub fn clear(&mut self) {
        self.state.last_counter = None;
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn relative_yaw(&self) -> f64 {
        self.state.relative_yaw
    }
}
