// vitrack_core/tests/tracker_sequencing.rs

use approx::assert_abs_diff_eq;
use nalgebra::{Isometry3, Matrix3, Matrix6, Translation3, UnitQuaternion, Vector3};
use vitrack_core::config::{ProcessModelConfig, TrackerConfig};
use vitrack_core::error::FilterError;
use vitrack_core::estimation::{BodyTracker, CorrectionOutcome, StateEstimator};
use vitrack_core::messages::{MeasurementData, MeasurementMessage, ModuleInput};
use vitrack_core::types::{BodyHandle, SensorHandle};
use vitrack_core::utils::exp_map::angular_distance;

const BODY: BodyHandle = BodyHandle(1);
const CAMERA: SensorHandle = SensorHandle(10);
const GYRO: SensorHandle = SensorHandle(11);

fn linear_velocity() -> Vector3<f64> {
    Vector3::new(1.0, 0.5, 0.0)
}

const YAW_RATE: f64 = 0.5;

fn truth(t: f64) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::from(linear_velocity() * t),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), YAW_RATE * t),
    )
}

fn pose_message(t: f64, pose: Isometry3<f64>) -> MeasurementMessage {
    MeasurementMessage {
        body_handle: BODY,
        sensor_handle: CAMERA,
        timestamp: t,
        data: MeasurementData::Pose {
            pose,
            covariance: Matrix6::identity() * 1e-4,
        },
    }
}

fn gyro_message(t: f64) -> MeasurementMessage {
    MeasurementMessage {
        body_handle: BODY,
        sensor_handle: GYRO,
        timestamp: t,
        data: MeasurementData::AngularVelocity {
            angular_velocity: Vector3::new(0.0, 0.0, YAW_RATE),
            covariance: Matrix3::identity() * 1e-3,
        },
    }
}

fn tracker(gate: Option<f64>) -> BodyTracker {
    let config = TrackerConfig {
        process_model: ProcessModelConfig::ConstantVelocity {
            position_noise: 0.01,
            orientation_noise: 0.1,
        },
        gate,
        ..TrackerConfig::default()
    };
    BodyTracker::new(BODY, config).unwrap()
}

/// Feeds four seconds of noiseless camera poses at 50 Hz, with a gyro reading
/// sharing every fifth timestamp and a bare time step in between.
fn run_stream(tracker: &mut BodyTracker) {
    for k in 1..=200 {
        let t = k as f64 * 0.02;
        let message = pose_message(t, truth(t));
        let outcome = tracker.process(&ModuleInput::Measurement { message: &message }).unwrap();
        assert!(
            matches!(outcome, CorrectionOutcome::Applied { .. }),
            "pose at t = {t}: {outcome:?}"
        );
        if k % 5 == 0 {
            let gyro = gyro_message(t);
            let outcome = tracker.process(&ModuleInput::Measurement { message: &gyro }).unwrap();
            assert!(matches!(outcome, CorrectionOutcome::Applied { .. }));
        }
        let outcome = tracker
            .process(&ModuleInput::TimeStep { current_time: t + 0.01 })
            .unwrap();
        assert_eq!(outcome, CorrectionOutcome::Predicted);
    }
}

#[test]
fn pose_stream_recovers_the_twist() {
    let mut tracker = tracker(None);
    run_stream(&mut tracker);

    let estimate = tracker.estimate();
    assert!(estimate.is_trustworthy());
    assert_abs_diff_eq!(estimate.timestamp, 4.01, epsilon = 1e-9);
    assert_abs_diff_eq!(estimate.linear_velocity, linear_velocity(), epsilon = 0.05);
    assert_abs_diff_eq!(
        estimate.angular_velocity,
        Vector3::new(0.0, 0.0, YAW_RATE),
        epsilon = 0.05
    );

    let expected = truth(4.01);
    assert!((estimate.pose.translation.vector - expected.translation.vector).norm() < 0.01);
    assert!(angular_distance(&estimate.pose.rotation, &expected.rotation) < 0.01);

    assert_eq!(tracker.applied_count(), 240);
    assert_eq!(tracker.rejected_invalid_count(), 0);
    assert_eq!(tracker.rejected_outlier_count(), 0);
}

#[test]
fn gate_rejects_a_wild_pose_without_touching_the_state() {
    let mut tracker = tracker(Some(16.0));
    run_stream(&mut tracker);

    let before = tracker.get_state().clone();
    let wild = truth(4.02) * Translation3::new(5.0, 0.0, 0.0);
    let message = pose_message(4.02, wild);
    let outcome = tracker.process(&ModuleInput::Measurement { message: &message }).unwrap();
    assert!(matches!(outcome, CorrectionOutcome::RejectedOutlier { .. }));
    assert_eq!(tracker.rejected_outlier_count(), 1);

    // Only the prediction to 4.02 happened.
    let moved = tracker.get_state().position - before.position;
    assert!((moved - before.velocity * 0.01).norm() < 1e-9);
}

#[test]
fn stale_messages_are_refused() {
    let mut tracker = tracker(None);
    let message = pose_message(0.5, truth(0.5));
    tracker.process(&ModuleInput::Measurement { message: &message }).unwrap();

    let stale = pose_message(0.25, truth(0.25));
    let err = tracker
        .process(&ModuleInput::Measurement { message: &stale })
        .unwrap_err();
    assert_eq!(
        err,
        FilterError::OutOfOrder {
            measurement: 0.25,
            state: 0.5
        }
    );

    // A time step into the past is simply a no-op.
    let outcome = tracker.process(&ModuleInput::TimeStep { current_time: 0.1 }).unwrap();
    assert_eq!(outcome, CorrectionOutcome::Predicted);
    assert_eq!(tracker.timestamp(), 0.5);
}
