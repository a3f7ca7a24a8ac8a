// vitrack_core/src/models/measurement/angular_velocity.rs

use super::{to_dvector, MeasurementModel};
use crate::state::PoseState;
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

/// A world-frame angular rate, e.g. a gyro reading already rotated out of the
/// body frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularVelocityMeasurement {
    measured: Vector3<f64>,
    covariance: Matrix3<f64>,
}

impl AngularVelocityMeasurement {
    pub fn new(measured: Vector3<f64>, covariance: Matrix3<f64>) -> Self {
        Self {
            measured,
            covariance,
        }
    }

    pub fn with_variances(measured: Vector3<f64>, variances: Vector3<f64>) -> Self {
        Self::new(measured, Matrix3::from_diagonal(&variances))
    }

    pub fn set_measurement(&mut self, measured: Vector3<f64>) {
        self.measured = measured;
    }
}

impl MeasurementModel<PoseState> for AngularVelocityMeasurement {
    type Value = Vector3<f64>;

    fn dim(&self) -> usize {
        3
    }

    fn measurement(&self) -> &Vector3<f64> {
        &self.measured
    }

    fn predict(&self, state: &PoseState) -> Vector3<f64> {
        state.angular_velocity
    }

    fn difference(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> DVector<f64> {
        to_dvector(&(a - b))
    }

    fn covariance(&self, _state: &PoseState) -> DMatrix<f64> {
        DMatrix::from_column_slice(3, 3, self.covariance.as_slice())
    }
}
