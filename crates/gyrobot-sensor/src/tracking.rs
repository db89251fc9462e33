use crate::calibration::{CalibrationState, CalibrationTracker};
use crate::frame::decode;
use crate::target::synthesize;
use crate::types::{SensorSample, TargetOrientation};
use glam::DVec3;
use tokio::sync::watch;

/// What a sensor transport drives. Angles are radians in device convention.
pub trait SampleSink {
    /// Offer a new calibration reference. Returns `true` if it was accepted.
    fn reset(&mut self, counter: u64, vehicle_forward: DVec3, sensor_forward: DVec3) -> bool;

    /// Recompute the target from the sensor's current angles.
    fn ingest_sample(&mut self, pitch: f64, yaw: f64, roll: f64);
}

/// Push one decoded message through a sink: offer the reset carried by its
/// counter, then ingest the angles. Returns whether the reset was accepted.
///
/// The angles are decoded here only to get the sensor forward for the reset
/// offer. Sinks take raw angles and decode them again in `ingest_sample`.
pub fn feed<S: SampleSink + ?Sized>(sink: &mut S, sample: &SensorSample, vehicle_forward: DVec3) -> bool {
    let sensor = decode(sample.pitch, sample.yaw, sample.roll);
    let accepted = sink.reset(sample.counter, vehicle_forward, sensor.forward);
    sink.ingest_sample(sample.pitch, sample.yaw, sample.roll);
    accepted
}

/// The ingest side's single writer: owns the calibration and publishes
/// snapshots of it and of the target.
pub struct Tracker {
    calibration: CalibrationTracker,
    target_tx: watch::Sender<TargetOrientation>,
    calibration_tx: watch::Sender<CalibrationState>,
}

impl Tracker {
    pub fn new(
        target_tx: watch::Sender<TargetOrientation>,
        calibration_tx: watch::Sender<CalibrationState>,
    ) -> Self {
        Self {
            calibration: CalibrationTracker::new(),
            target_tx,
            calibration_tx,
        }
    }

    /// Accept the next reset regardless of its counter (e.g. after the
    /// sensor page was reloaded and its counter restarted).
    pub fn clear_calibration(&mut self) {
        self.calibration.clear();
        self.calibration_tx.send_replace(*self.calibration.state());
        tracing::info!("Calibration counter cleared");
    }
}

impl SampleSink for Tracker {
    fn reset(&mut self, counter: u64, vehicle_forward: DVec3, sensor_forward: DVec3) -> bool {
        if !self.calibration.reset(counter, vehicle_forward, sensor_forward) {
            return false;
        }

        let state = *self.calibration.state();
        self.calibration_tx.send_replace(state);
        tracing::info!(
            counter,
            relative_yaw_deg = state.relative_yaw.to_degrees(),
            "Calibration reset accepted"
        );
        true
    }

    fn ingest_sample(&mut self, pitch: f64, yaw: f64, roll: f64) {
        let sensor = decode(pitch, yaw, roll);
        let target = synthesize(&sensor, self.calibration.relative_yaw());
        self.target_tx.send_replace(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> (
        Tracker,
        watch::Receiver<TargetOrientation>,
        watch::Receiver<CalibrationState>,
    ) {
        let (target_tx, target_rx) = watch::channel(TargetOrientation::DEFAULT);
        let (calibration_tx, calibration_rx) = watch::channel(CalibrationState::default());
        (Tracker::new(target_tx, calibration_tx), target_rx, calibration_rx)
    }

    fn sample(alpha_deg: f64, counter: u64) -> SensorSample {
        SensorSample {
            pitch: 0.0,
            yaw: alpha_deg.to_radians(),
            roll: 0.0,
            counter,
        }
    }

    #[test]
    fn first_sample_calibrates_and_targets_vehicle_forward() {
        let (mut tracker, target_rx, calibration_rx) = tracker();
        let vehicle_forward = DVec3::Y;

        assert!(feed(&mut tracker, &sample(30.0, 0), vehicle_forward));

        let calibration = *calibration_rx.borrow();
        assert_eq!(calibration.last_counter, Some(0));
        assert_eq!(calibration.vehicle_forward, vehicle_forward);
        assert!((target_rx.borrow().forward - vehicle_forward).length() < 1e-9);
    }

    #[test]
    fn offset_holds_between_resets() {
        let (mut tracker, target_rx, _calibration_rx) = tracker();
        feed(&mut tracker, &sample(0.0, 0), DVec3::Y);

        // Same counter: no recalibration even though the vehicle moved.
        assert!(!feed(&mut tracker, &sample(90.0, 0), DVec3::NEG_X));

        // Device turned 90 degrees clockwise, so the target turns from +Y to +X.
        assert!((target_rx.borrow().forward - DVec3::X).length() < 1e-9);
    }

    #[test]
    fn new_counter_recalibrates() {
        let (mut tracker, target_rx, calibration_rx) = tracker();
        feed(&mut tracker, &sample(0.0, 0), DVec3::Y);
        assert!(feed(&mut tracker, &sample(90.0, 1), DVec3::NEG_X));

        assert_eq!(calibration_rx.borrow().last_counter, Some(1));
        assert!((target_rx.borrow().forward - DVec3::NEG_X).length() < 1e-9);
    }

    /// Records what a transport hands to the sink.
    #[derive(Default)]
    struct Recording {
        offered: Vec<(u64, DVec3, DVec3)>,
        ingested: Vec<(f64, f64, f64)>,
    }

    impl SampleSink for Recording {
        fn reset(&mut self, counter: u64, vehicle_forward: DVec3, sensor_forward: DVec3) -> bool {
            self.offered.push((counter, vehicle_forward, sensor_forward));
            true
        }

        fn ingest_sample(&mut self, pitch: f64, yaw: f64, roll: f64) {
            self.ingested.push((pitch, yaw, roll));
        }
    }

    #[test]
    fn feed_offers_the_frame_it_then_ingests() {
        let mut sink = Recording::default();
        let sample = SensorSample {
            pitch: 0.2,
            yaw: 1.1,
            roll: -0.4,
            counter: 5,
        };

        assert!(feed(&mut sink, &sample, DVec3::Y));

        assert_eq!(sink.ingested, vec![(0.2, 1.1, -0.4)]);
        let (counter, vehicle_forward, sensor_forward) = sink.offered[0];
        assert_eq!(counter, 5);
        assert_eq!(vehicle_forward, DVec3::Y);
        assert_eq!(sensor_forward, decode(0.2, 1.1, -0.4).forward);
    }

    #[test]
    fn cleared_tracker_accepts_restarted_counter() {
        let (mut tracker, _target_rx, calibration_rx) = tracker();
        feed(&mut tracker, &sample(0.0, 12), DVec3::Y);

        tracker.clear_calibration();
        assert_eq!(calibration_rx.borrow().last_counter, None);

        assert!(feed(&mut tracker, &sample(0.0, 0), DVec3::X));
        assert_eq!(calibration_rx.borrow().last_counter, Some(0));
    }
}
