// vitrack_core/src/models/measurement/orientation.rs

use super::{to_dvector, MeasurementModel};
use crate::state::PoseState;
use crate::utils::exp_map::rotation_difference;
use nalgebra::{DMatrix, DVector, Matrix3, UnitQuaternion, Vector3};

/// An absolute orientation fix, e.g. from an optical pose solve.
///
/// The residual is the world-frame rotation vector taking the predicted
/// orientation onto the measured one, always the short way round.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsoluteOrientationMeasurement {
    measured: UnitQuaternion<f64>,
    /// 3x3 noise covariance over the rotation vector, rad^2.
    covariance: Matrix3<f64>,
}

impl AbsoluteOrientationMeasurement {
    pub fn new(measured: UnitQuaternion<f64>, covariance: Matrix3<f64>) -> Self {
        Self {
            measured,
            covariance,
        }
    }

    /// Independent per-axis variances.
    pub fn with_variances(measured: UnitQuaternion<f64>, variances: Vector3<f64>) -> Self {
        Self::new(measured, Matrix3::from_diagonal(&variances))
    }

    pub fn set_measurement(&mut self, measured: UnitQuaternion<f64>) {
        self.measured = measured;
    }

    pub fn set_covariance(&mut self, covariance: Matrix3<f64>) {
        self.covariance = covariance;
    }
}

impl MeasurementModel<PoseState> for AbsoluteOrientationMeasurement {
    type Value = UnitQuaternion<f64>;

    fn dim(&self) -> usize {
        3
    }

    fn measurement(&self) -> &UnitQuaternion<f64> {
        &self.measured
    }

    fn predict(&self, state: &PoseState) -> UnitQuaternion<f64> {
        state.orientation
    }

    fn difference(&self, a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> DVector<f64> {
        to_dvector(&rotation_difference(a, b))
    }

    fn covariance(&self, _state: &PoseState) -> DMatrix<f64> {
        DMatrix::from_column_slice(3, 3, self.covariance.as_slice())
    }
}
