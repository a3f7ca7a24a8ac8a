// vitrack_core/src/models/measurement/mod.rs

use crate::state::FilterState;
use nalgebra::{DMatrix, DVector, Vector3};
use std::fmt::Debug;

pub mod angular_velocity;
pub mod orientation;
pub mod pose;
pub mod position;

pub use angular_velocity::AngularVelocityMeasurement;
pub use orientation::AbsoluteOrientationMeasurement;
pub use pose::AbsolutePoseMeasurement;
pub use position::AbsolutePositionMeasurement;

// --- MEASUREMENT MODEL TRAIT ---
// Represents one observation of a sensor: `z = h(x) + v`, with `v ~ N(0, R)`.
//
// Measurement values need not live in a vector space (an orientation is a
// quaternion), so the model supplies its own difference rule `⊖` that maps a
// pair of values onto a flat tangent vector of length `dim()`.
pub trait MeasurementModel<S: FilterState>: Debug + Send + Sync {
    /// The type of a measured or predicted value.
    type Value: Clone + Debug;

    /// Tangent dimension `m` of the measurement.
    fn dim(&self) -> usize;

    /// The value actually observed.
    fn measurement(&self) -> &Self::Value;

    /// The ideal measurement `h(x)` of a (sigma-point) state.
    fn predict(&self, state: &S) -> Self::Value;

    /// `a ⊖ b` in the measurement tangent space.
    fn difference(&self, a: &Self::Value, b: &Self::Value) -> DVector<f64>;

    /// The `m x m` measurement noise covariance `R`.
    fn covariance(&self, state: &S) -> DMatrix<f64>;

    /// `measured ⊖ predicted`.
    fn residual(&self, predicted: &Self::Value) -> DVector<f64> {
        self.difference(self.measurement(), predicted)
    }
}

pub(crate) fn to_dvector(v: &Vector3<f64>) -> DVector<f64> {
    DVector::from_column_slice(v.as_slice())
}
