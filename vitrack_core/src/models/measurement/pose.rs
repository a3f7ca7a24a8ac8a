// vitrack_core/src/models/measurement/pose.rs

use super::MeasurementModel;
use crate::state::PoseState;
use crate::utils::exp_map::rotation_difference;
use nalgebra::{DMatrix, DVector, Isometry3, Matrix6};

/// A full 6-DOF pose fix: position residual followed by rotation residual.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsolutePoseMeasurement {
    measured: Isometry3<f64>,
    /// Ordered as (position, rotation vector), matching the state head.
    covariance: Matrix6<f64>,
}

impl AbsolutePoseMeasurement {
    pub fn new(measured: Isometry3<f64>, covariance: Matrix6<f64>) -> Self {
        Self {
            measured,
            covariance,
        }
    }

    /// Isotropic position and orientation variances.
    pub fn with_variances(
        measured: Isometry3<f64>,
        position_variance: f64,
        orientation_variance: f64,
    ) -> Self {
        let mut covariance = Matrix6::zeros();
        for i in 0..3 {
            covariance[(i, i)] = position_variance;
            covariance[(i + 3, i + 3)] = orientation_variance;
        }
        Self::new(measured, covariance)
    }

    pub fn set_measurement(&mut self, measured: Isometry3<f64>) {
        self.measured = measured;
    }
}

impl MeasurementModel<PoseState> for AbsolutePoseMeasurement {
    type Value = Isometry3<f64>;

    fn dim(&self) -> usize {
        6
    }

    fn measurement(&self) -> &Isometry3<f64> {
        &self.measured
    }

    fn predict(&self, state: &PoseState) -> Isometry3<f64> {
        state.pose()
    }

    fn difference(&self, a: &Isometry3<f64>, b: &Isometry3<f64>) -> DVector<f64> {
        let translation = a.translation.vector - b.translation.vector;
        let rotation = rotation_difference(&a.rotation, &b.rotation);
        DVector::from_iterator(6, translation.iter().chain(rotation.iter()).copied())
    }

    fn covariance(&self, _state: &PoseState) -> DMatrix<f64> {
        DMatrix::from_column_slice(6, 6, self.covariance.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};

    #[test]
    fn residual_stacks_position_then_rotation() {
        let measured = Isometry3::from_parts(
            Translation3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.1),
        );
        let model = AbsolutePoseMeasurement::with_variances(measured, 1e-4, 1e-5);
        let residual = model.residual(&model.predict(&PoseState::new()));
        assert_eq!(residual.len(), 6);
        assert_abs_diff_eq!(
            residual,
            DVector::from_vec(vec![1.0, 0.0, 0.0, 0.0, 0.1, 0.0]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn covariance_blocks_are_placed_on_the_diagonal() {
        let model = AbsolutePoseMeasurement::with_variances(Isometry3::identity(), 1e-4, 1e-5);
        let r = model.covariance(&PoseState::new());
        assert_eq!(r[(0, 0)], 1e-4);
        assert_eq!(r[(5, 5)], 1e-5);
        assert_eq!(r[(0, 5)], 0.0);
    }
}
