// vitrack_core/src/state.rs

pub mod layout;

use nalgebra::{DMatrix, Isometry3, Matrix6, Translation3, UnitQuaternion, Vector3};

use crate::error::FilterError;
use crate::types::{Covariance, TangentVector};
use crate::utils::exp_map::rotation_vector_to_quat;
use crate::utils::validity::matrix_contents_invalid;
use layout::{ANGULAR_VELOCITY, POSE_DIM, POSE_STATE_DIM, POSITION, ROTATION, VELOCITY};

/// Variance placed on every tangent axis of a freshly created state.
pub const DEFAULT_INITIAL_VARIANCE: f64 = 10.0;

/// The contract the correction engine and the driver are generic over.
///
/// A filter state is an "on-manifold" mean paired with an error-state
/// covariance over a flat tangent space of dimension [`dim`](Self::dim). All
/// Kalman arithmetic happens in that tangent space; the mean is only touched
/// through [`apply_correction`](Self::apply_correction).
pub trait FilterState: Clone {
    /// Tangent-space dimension, equal to the covariance side length.
    fn dim(&self) -> usize;

    fn covariance(&self) -> &Covariance;

    fn set_covariance(&mut self, covariance: Covariance);

    /// Retracts a tangent vector of length `dim()` onto the mean: `x ← x ⊕ δ`.
    fn apply_correction(&mut self, delta: &TangentVector);

    /// True if any component of the mean is NaN or infinite.
    fn state_contents_invalid(&self) -> bool;

    /// True if any entry of the covariance is NaN or infinite.
    fn covariance_contents_invalid(&self) -> bool {
        matrix_contents_invalid(self.covariance())
    }

    /// Fails unless the covariance is `dim() x dim()`.
    fn check_covariance_shape(&self) -> Result<(), FilterError> {
        let n = self.dim();
        let (rows, cols) = self.covariance().shape();
        if rows != n {
            Err(FilterError::DimensionMismatch {
                expected: n,
                actual: rows,
            })
        } else if cols != n {
            Err(FilterError::DimensionMismatch {
                expected: n,
                actual: cols,
            })
        } else {
            Ok(())
        }
    }
}

/// Rigid-body pose and twist of one tracked body.
///
/// Everything is expressed in the world frame. `orientation` rotates
/// body-frame vectors into the world frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseState {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub velocity: Vector3<f64>,
    /// Rotation vector rate, rad/s.
    pub angular_velocity: Vector3<f64>,
    /// Error-state covariance over the 12-dimensional tangent layout in [`layout`].
    pub covariance: DMatrix<f64>,
}

impl Default for PoseState {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseState {
    /// A body at rest at the origin with identity orientation and covariance
    /// `DEFAULT_INITIAL_VARIANCE * I`.
    pub fn new() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            covariance: DMatrix::identity(POSE_STATE_DIM, POSE_STATE_DIM)
                * DEFAULT_INITIAL_VARIANCE,
        }
    }

    pub fn with_position(mut self, position: Vector3<f64>) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vector3<f64>) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_covariance(mut self, covariance: DMatrix<f64>) -> Self {
        self.covariance = covariance;
        self
    }

    /// Replaces the covariance with `variance * I` and leaves the mean alone.
    pub fn reset_covariance(&mut self, variance: f64) {
        self.covariance = DMatrix::identity(POSE_STATE_DIM, POSE_STATE_DIM) * variance;
    }

    pub fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }

    /// The position/rotation block of the covariance.
    pub fn pose_covariance(&self) -> Matrix6<f64> {
        self.covariance
            .fixed_view::<POSE_DIM, POSE_DIM>(0, 0)
            .into_owned()
    }
}

impl FilterState for PoseState {
    fn dim(&self) -> usize {
        POSE_STATE_DIM
    }

    fn covariance(&self) -> &Covariance {
        &self.covariance
    }

    fn set_covariance(&mut self, covariance: Covariance) {
        self.covariance = covariance;
    }

    fn apply_correction(&mut self, delta: &TangentVector) {
        debug_assert_eq!(delta.len(), POSE_STATE_DIM);

        // --- Euclidean parts are plain additions ---
        self.position += delta.fixed_rows::<3>(POSITION.start);
        self.velocity += delta.fixed_rows::<3>(VELOCITY.start);
        self.angular_velocity += delta.fixed_rows::<3>(ANGULAR_VELOCITY.start);

        // --- Rotation goes through the exponential map ---
        let rotation: Vector3<f64> = delta.fixed_rows::<3>(ROTATION.start).into_owned();
        let composed = rotation_vector_to_quat(&rotation) * self.orientation;
        self.orientation = UnitQuaternion::new_normalize(composed.into_inner());
    }

    fn state_contents_invalid(&self) -> bool {
        matrix_contents_invalid(&self.position)
            || matrix_contents_invalid(&self.orientation.coords)
            || matrix_contents_invalid(&self.velocity)
            || matrix_contents_invalid(&self.angular_velocity)
    }
}
