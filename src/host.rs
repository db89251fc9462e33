use glam::{DQuat, DVec3};
use gyrobot_config::{ControlConfig, HostConfig};
use gyrobot_control::kinematics::RotationalKinematics;
use gyrobot_control::{ActuationCommand, FieldInfo, Tick, MAX_TIME_DELTA};

/// The simulation the agent is plugged into.
pub trait SimulationHost {
    fn field_info(&self) -> FieldInfo;

    /// Advance by `elapsed` seconds of wall time and report the vehicle.
    fn poll(&mut self, elapsed: f64) -> Tick;

    /// Command to apply until the next poll.
    fn apply(&mut self, command: &ActuationCommand);
}

/// Stand-in host that holds the vehicle at a fixed point and only lets it
/// rotate.
pub struct HeldHost {
    tick_rate_hz: f64,
    position: DVec3,
    vehicle: RotationalKinematics,
    command: ActuationCommand,
}

impl HeldHost {
    pub fn new(tick_rate_hz: f64, host: &HostConfig, control: &ControlConfig) -> Self {
        Self {
            tick_rate_hz,
            position: host.hold_position,
            vehicle: RotationalKinematics::new(
                DQuat::from_rotation_z(host.spawn_yaw),
                control.max_angular_acceleration,
            ),
            command: ActuationCommand::default(),
        }
    }
}

impl SimulationHost for HeldHost {
    fn field_info(&self) -> FieldInfo {
        FieldInfo {
            tick_rate_hz: self.tick_rate_hz,
        }
    }

    /// Steps longer than `MAX_TIME_DELTA` are integrated as that long, matching
    /// what the agent assumes after a stall.
    fn poll(&mut self, elapsed: f64) -> Tick {
        let elapsed = if elapsed.is_finite() && elapsed > 0.0 {
            elapsed.min(MAX_TIME_DELTA)
        } else {
            0.0
        };
        if elapsed > 0.0 {
            self.vehicle.apply(&self.command, elapsed);
        }
        Tick {
            pose: self.vehicle.pose(self.position),
            time_delta: elapsed,
        }
    }

    fn apply(&mut self, command: &ActuationCommand) {
        self.command = *command;
    }
}
