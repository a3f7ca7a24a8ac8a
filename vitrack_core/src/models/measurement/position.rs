// vitrack_core/src/models/measurement/position.rs

use super::{to_dvector, MeasurementModel};
use crate::state::PoseState;
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

/// An absolute world-frame position fix.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsolutePositionMeasurement {
    measured: Vector3<f64>,
    covariance: Matrix3<f64>,
}

impl AbsolutePositionMeasurement {
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

impl MeasurementModel<PoseState> for AbsolutePositionMeasurement {
    type Value = Vector3<f64>;

    fn dim(&self) -> usize {
        3
    }

    fn measurement(&self) -> &Vector3<f64> {
        &self.measured
    }

    fn predict(&self, state: &PoseState) -> Vector3<f64> {
        state.position
    }

    fn difference(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> DVector<f64> {
        to_dvector(&(a - b))
    }

    fn covariance(&self, _state: &PoseState) -> DMatrix<f64> {
        DMatrix::from_column_slice(3, 3, self.covariance.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn residual_is_plain_subtraction() {
        let model = AbsolutePositionMeasurement::with_variances(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::repeat(0.01),
        );
        let state = PoseState::new().with_position(Vector3::new(0.5, 2.5, 3.0));
        let residual = model.residual(&model.predict(&state));
        assert_abs_diff_eq!(residual, DVector::from_vec(vec![0.5, -0.5, 0.0]));
    }

    #[test]
    fn set_measurement_reuses_the_model() {
        let mut model =
            AbsolutePositionMeasurement::with_variances(Vector3::zeros(), Vector3::repeat(0.01));
        model.set_measurement(Vector3::new(0.0, 0.0, 4.0));
        assert_eq!(model.measurement().z, 4.0);
        assert_eq!(model.covariance(&PoseState::new())[(2, 2)], 0.01);
    }
}
