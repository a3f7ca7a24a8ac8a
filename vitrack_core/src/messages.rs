// vitrack_core/src/messages.rs

use crate::types::{BodyHandle, SensorHandle};
use nalgebra::{Isometry3, Matrix3, Matrix6, UnitQuaternion, Vector3};

// =========================================================================
// == Core Message and Data Enums ==
// =========================================================================

/// A self-describing observation of one tracked body, with its noise.
///
/// Every variant carries the covariance of the measurement it holds, expressed
/// over the same tangent space its residual lives in.
#[derive(Clone, Debug, PartialEq)]
pub enum MeasurementData {
    /// World-frame orientation; covariance over the rotation vector.
    Orientation {
        orientation: UnitQuaternion<f64>,
        covariance: Matrix3<f64>,
    },
    Position {
        position: Vector3<f64>,
        covariance: Matrix3<f64>,
    },
    /// Covariance ordered as (position, rotation vector).
    Pose {
        pose: Isometry3<f64>,
        covariance: Matrix6<f64>,
    },
    /// World-frame angular rate, rad/s.
    AngularVelocity {
        angular_velocity: Vector3<f64>,
        covariance: Matrix3<f64>,
    },
}

impl MeasurementData {
    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MeasurementData::Orientation { .. } => "orientation",
            MeasurementData::Position { .. } => "position",
            MeasurementData::Pose { .. } => "pose",
            MeasurementData::AngularVelocity { .. } => "angular_velocity",
        }
    }
}

/// The generic message that carries all sensor data through the system.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementMessage {
    pub body_handle: BodyHandle,
    pub sensor_handle: SensorHandle,
    /// Seconds, on the same monotonic clock as `ModuleInput::TimeStep`.
    pub timestamp: f64,
    pub data: MeasurementData,
}

/// The universal input packet for all `StateEstimator` implementations.
#[derive(Clone, Copy, Debug)]
pub enum ModuleInput<'a> {
    /// Bring the estimate forward to `current_time` without new data.
    TimeStep { current_time: f64 },
    Measurement { message: &'a MeasurementMessage },
}

// =========================================================================
// == Public API Messages ==
// =========================================================================

/// The output of a tracker: a snapshot of the committed state.
///
/// Consumers must check the two validity flags before trusting the pose.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseEstimate {
    pub body_handle: BodyHandle,
    pub timestamp: f64,
    pub pose: Isometry3<f64>,
    pub linear_velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
    pub pose_covariance: Matrix6<f64>,
    pub state_contents_invalid: bool,
    pub covariance_contents_invalid: bool,
}

impl PoseEstimate {
    pub fn is_trustworthy(&self) -> bool {
        !self.state_contents_invalid && !self.covariance_contents_invalid
    }
}
