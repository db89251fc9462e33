use crate::types::VehiclePose;
use glam::{DMat3, DQuat, DVec3};
use gyrobot_sensor::types::{Orientation, TargetOrientation};

/// Build a rotation matrix (columns forward, left, up) that looks along
/// `forward` with its roof toward `up`.
///
/// `up` only needs to be roughly right: it is re-orthogonalized against
/// `forward`, with fallbacks when the two are parallel.
pub fn look_at(forward: DVec3, up: DVec3) -> DMat3 {
    Orientation::new(forward, up).orthonormalized().to_mat3()
}

/// Body-frame rotation vector (axis * angle, radians) that takes `current`
/// onto `goal` along the shortest path.
pub fn rotation_error(current: &DMat3, goal: &DMat3) -> DVec3 {
    let current = DQuat::from_mat3(current).normalize();
    let goal = DQuat::from_mat3(goal).normalize();

    let mut delta = (current.conjugate() * goal).normalize();
    if delta.w < 0.0 {
        delta = -delta;
    }

    let v = delta.xyz();
    let s = v.length();
    if s < 1e-12 {
        // sin(a/2) ~ a/2
        2.0 * v
    } else {
        v * (2.0 * s.atan2(delta.w) / s)
    }
}

/// Proportional-derivative attitude controller.
///
/// Stateless: every tick is a pure function of the pose, the target and the
/// elapsed time. Gains are derived per axis from a natural frequency and
/// damping ratio, scaled by how much angular acceleration a full command buys
/// on that axis, so every axis responds the same way until it saturates.
#[derive(Debug, Clone, Copy)]
pub struct RotationController {
    kp: DVec3,
    kd: DVec3,
}

impl RotationController {
    /// `authority` is the angular acceleration (rad/s^2) at full command about
    /// forward, left and up.
    pub fn new(natural_frequency: f64, damping_ratio: f64, authority: DVec3) -> Self {
        let authority = authority.abs().max(DVec3::splat(f64::EPSILON));
        Self {
            kp: DVec3::splat(natural_frequency * natural_frequency) / authority,
            kd: DVec3::splat(2.0 * damping_ratio * natural_frequency) / authority,
        }
    }

    /// Normalized (roll, pitch, yaw) command for this tick.
    ///
    /// The proportional term acts on the error expected one tick from now
    /// given the current spin, which keeps the loop from chasing an error
    /// that is already being closed.
    pub fn step(&self, pose: &VehiclePose, target: &TargetOrientation, dt: f64) -> DVec3 {
        let goal = look_at(target.forward, target.up);
        let error = rotation_error(&pose.orientation, &goal);
        let omega = pose.orientation.transpose() * pose.angular_velocity;

        let command = self.kp * (error - omega * dt) - self.kd * omega;
        if !command.is_finite() {
            tracing::warn!(?pose, ?target, "Non-finite control output, commanding zero");
            return DVec3::ZERO;
        }
        command.clamp(DVec3::NEG_ONE, DVec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::RotationalKinematics;
    use crate::types::ActuationCommand;

    const DT: f64 = 1.0 / 120.0;
    const AUTHORITY: DVec3 = DVec3::new(36.0, 12.0, 9.0);

    fn controller() -> RotationController {
        RotationController::new(8.0, 1.0, AUTHORITY)
    }

    fn quat(axis: DVec3, degrees: f64) -> DQuat {
        DQuat::from_axis_angle(axis.normalize(), degrees.to_radians())
    }

    fn target_from(q: DQuat) -> TargetOrientation {
        TargetOrientation {
            forward: q * DVec3::X,
            up: q * DVec3::Z,
        }
    }

    /// Error (degrees) at the start of each tick while tracking a fixed target.
    fn track(start: DQuat, goal: DQuat, dts: impl IntoIterator<Item = f64>) -> Vec<f64> {
        let controller = controller();
        let target = target_from(goal);
        let goal_mat = look_at(target.forward, target.up);
        let mut vehicle = RotationalKinematics::new(start, AUTHORITY);

        dts.into_iter()
            .map(|dt| {
                let pose = vehicle.pose(DVec3::ZERO);
                let error = rotation_error(&pose.orientation, &goal_mat).length().to_degrees();
                let torque = controller.step(&pose, &target, dt);
                vehicle.apply(
                    &ActuationCommand {
                        roll: torque.x,
                        pitch: torque.y,
                        yaw: torque.z,
                        ..Default::default()
                    },
                    dt,
                );
                error
            })
            .collect()
    }

    fn assert_converges(name: &str, errors: &[f64]) {
        let reached = errors
            .iter()
            .position(|&e| e < 1.0)
            .unwrap_or_else(|| panic!("{name}: never within 1 degree"));
        assert!(reached < 200, "{name}: took {reached} ticks");

        for i in 10..errors.len() {
            assert!(
                errors[i] <= errors[i - 1] + 1e-6,
                "{name}: error grew at tick {i}: {} -> {}",
                errors[i - 1],
                errors[i]
            );
        }
        assert!(errors[reached..].iter().all(|&e| e < 1.0), "{name}: left tolerance");
    }

    #[test]
    fn look_at_is_orthonormal_and_right_handed() {
        let m = look_at(DVec3::new(1.0, 1.0, 0.0), DVec3::new(0.2, 0.0, 1.0));
        assert!((m.determinant() - 1.0).abs() < 1e-12);
        assert!((m.transpose() * m - DMat3::IDENTITY).abs_diff_eq(DMat3::ZERO, 1e-12));
        assert!((m.x_axis - DVec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-12);
    }

    #[test]
    fn look_at_survives_forward_parallel_to_up() {
        let m = look_at(DVec3::Z, DVec3::Z);
        assert!(m.is_finite());
        assert!((m.determinant() - 1.0).abs() < 1e-12);
        assert!((m.x_axis - DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn rotation_error_is_body_frame_shortest_path() {
        let current = DMat3::from_quat(quat(DVec3::Z, 90.0));
        let goal = DMat3::from_quat(quat(DVec3::Z, 90.0) * quat(DVec3::X, 30.0));
        let e = rotation_error(&current, &goal);
        assert!((e - DVec3::new(30f64.to_radians(), 0.0, 0.0)).length() < 1e-9);

        let goal = DMat3::from_quat(quat(DVec3::Z, 90.0 + 200.0));
        let e = rotation_error(&current, &goal);
        assert!((e - DVec3::new(0.0, 0.0, -160f64.to_radians())).length() < 1e-9);
    }

    #[test]
    fn on_target_and_at_rest_commands_nothing() {
        let pose = VehiclePose {
            position: DVec3::ZERO,
            orientation: DMat3::IDENTITY,
            angular_velocity: DVec3::ZERO,
        };
        let target = TargetOrientation {
            forward: DVec3::X,
            up: DVec3::Z,
        };
        assert!(controller().step(&pose, &target, DT).length() < 1e-12);
    }

    #[test]
    fn spinning_on_target_is_damped() {
        let pose = VehiclePose {
            position: DVec3::ZERO,
            orientation: DMat3::IDENTITY,
            angular_velocity: DVec3::new(0.0, 0.0, 0.5),
        };
        let target = TargetOrientation {
            forward: DVec3::X,
            up: DVec3::Z,
        };
        let command = controller().step(&pose, &target, DT);
        assert!(command.z < 0.0);
        assert!(command.x.abs() < 1e-12 && command.y.abs() < 1e-12);
    }

    #[test]
    fn default_target_gives_bounded_command() {
        let pose = VehiclePose {
            position: DVec3::ZERO,
            orientation: DMat3::IDENTITY,
            angular_velocity: DVec3::ZERO,
        };
        let command = controller().step(&pose, &TargetOrientation::DEFAULT, DT);
        assert!(command.is_finite());
        assert!(command.abs().max_element() <= 1.0);
        assert!(command.length() > 0.0);
    }

    #[test]
    fn garbage_pose_commands_zero() {
        let pose = VehiclePose {
            position: DVec3::ZERO,
            orientation: DMat3::from_cols(DVec3::splat(f64::NAN), DVec3::Y, DVec3::Z),
            angular_velocity: DVec3::ZERO,
        };
        let command = controller().step(&pose, &TargetOrientation::DEFAULT, DT);
        assert_eq!(command, DVec3::ZERO);
    }

    #[test]
    fn converges_from_single_axis_offsets() {
        let identity = DQuat::IDENTITY;
        for (name, start) in [
            ("yaw 80", quat(DVec3::Z, 80.0)),
            ("roll 85", quat(DVec3::X, 85.0)),
            ("pitch -70", quat(DVec3::Y, -70.0)),
        ] {
            let errors = track(start, identity, std::iter::repeat(DT).take(300));
            assert_converges(name, &errors);
        }
    }

    #[test]
    fn converges_from_combined_offsets() {
        let cases = [
            ("diagonal 60", quat(DVec3::new(1.0, 1.0, 0.0), 60.0), DQuat::IDENTITY),
            (
                "to yaw 45 pitch 30",
                DQuat::IDENTITY,
                quat(DVec3::Z, 45.0) * quat(DVec3::Y, -30.0),
            ),
            (
                "mixed",
                quat(DVec3::Z, 120.0) * quat(DVec3::X, 40.0),
                quat(DVec3::Z, 60.0) * quat(DVec3::Y, 20.0),
            ),
        ];
        for (name, start, goal) in cases {
            let errors = track(start, goal, std::iter::repeat(DT).take(300));
            assert_converges(name, &errors);
        }
    }

    #[test]
    fn converges_with_uneven_tick_lengths() {
        let dts = (0..400).map(|i| match i % 3 {
            0 => 1.0 / 240.0,
            1 => 1.0 / 60.0,
            _ => 1.0 / 120.0,
        });
        let errors = track(quat(DVec3::Z, 80.0), DQuat::IDENTITY, dts);
        let last = *errors.last().unwrap();
        assert!(last < 0.01, "final error {last}");
    }
}
