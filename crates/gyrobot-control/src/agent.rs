use crate::controller::RotationController;
use crate::input::InputProvider;
use crate::types::{ActuationCommand, VehiclePose};
use glam::DVec3;
use gyrobot_sensor::types::TargetOrientation;
use gyrobot_sensor::SensorLink;

/// Ticks longer than this (seconds) are treated as this long.
pub const MAX_TIME_DELTA: f64 = 0.1;

/// Where the agent gets its target from, and where it reports the vehicle's
/// heading for the next calibration. Must not block.
pub trait TargetSource {
    fn target(&self) -> TargetOrientation;

    /// Vehicle forward captured at the last calibration, for debug drawing.
    fn reference_forward(&self) -> DVec3;

    fn observe_vehicle(&self, forward: DVec3);
}

impl TargetSource for SensorLink {
    fn target(&self) -> TargetOrientation {
        SensorLink::target(self)
    }

    fn reference_forward(&self) -> DVec3 {
        self.calibration().vehicle_forward
    }

    fn observe_vehicle(&self, forward: DVec3) {
        self.publish_vehicle_forward(forward);
    }
}

/// A fixed target with no calibration behind it.
impl TargetSource for TargetOrientation {
    fn target(&self) -> TargetOrientation {
        *self
    }

    fn reference_forward(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn observe_vehicle(&self, _forward: DVec3) {}
}

/// Static information the host provides once, before the first tick.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    /// Nominal tick rate of the host (Hz).
    pub tick_rate_hz: f64,
}

/// What the host supplies every tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub pose: VehiclePose,
    /// Real elapsed time since the previous tick (seconds).
    pub time_delta: f64,
}

/// Vectors for on-screen debug lines, refreshed every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DebugView {
    pub target_forward: DVec3,
    pub current_forward: DVec3,
    pub reference_forward: DVec3,
}

/// The per-tick side: reads the published target, runs the controller and
/// merges the digital inputs.
pub struct Agent<T, I> {
    controller: RotationController,
    targets: T,
    input: I,
    nominal_dt: f64,
    debug: DebugView,
}

impl<T: TargetSource, I: InputProvider> Agent<T, I> {
    pub fn initialize(field: &FieldInfo, controller: RotationController, targets: T, input: I) -> Self {
        let nominal_dt = if field.tick_rate_hz.is_finite() && field.tick_rate_hz > 0.0 {
            (1.0 / field.tick_rate_hz).min(MAX_TIME_DELTA)
        } else {
            tracing::warn!(tick_rate_hz = field.tick_rate_hz, "Unusable tick rate, assuming 120 Hz");
            1.0 / 120.0
        };

        Self {
            controller,
            targets,
            input,
            nominal_dt,
            debug: DebugView::default(),
        }
    }

    pub fn step(&mut self, tick: &Tick) -> ActuationCommand {
        let pose = &tick.pose;
        self.targets.observe_vehicle(pose.forward());

        let target = self.targets.target();
        let dt = self.time_step(tick.time_delta);
        let torque = self.controller.step(pose, &target, dt);
        let flags = self.input.sample();

        self.debug = DebugView {
            target_forward: target.forward,
            current_forward: pose.forward(),
            reference_forward: self.targets.reference_forward(),
        };

        ActuationCommand {
            roll: torque.x,
            pitch: torque.y,
            yaw: torque.z,
            boost: flags.boost,
            jump: flags.jump,
        }
    }

    pub fn debug_view(&self) -> DebugView {
        self.debug
    }

    pub fn targets(&self) -> &T {
        &self.targets
    }

    fn time_step(&self, time_delta: f64) -> f64 {
        if time_delta.is_finite() && time_delta > 0.0 {
            time_delta.min(MAX_TIME_DELTA)
        } else {
            self.nominal_dt
        }
    }
}
