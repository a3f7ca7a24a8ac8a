// vitrack_core/src/models/process/mod.rs

use crate::error::FilterError;
use crate::state::layout::{ANGULAR_VELOCITY, POSE_STATE_DIM, POSITION, ROTATION, VELOCITY};
use crate::state::FilterState;
use nalgebra::DMatrix;
use std::fmt::Debug;

pub mod constant_velocity;
pub mod damped_constant_velocity;

pub use constant_velocity::ConstantVelocityProcessModel;
pub use damped_constant_velocity::DampedConstantVelocityProcessModel;

/// A motion model used to advance a filter state in time.
///
/// Models hold only fixed parameters, so one instance can serve any number of
/// tracked bodies, from any thread.
pub trait ProcessModel<S: FilterState>: Debug + Send + Sync {
    /// Advances `state` by `dt` seconds.
    ///
    /// # Returns
    /// A tuple `(predicted, Q)`: `predicted` carries the advanced mean and the
    /// propagated covariance `A * P * A^T`; `Q` is the additive process noise for
    /// this interval, which the caller adds before storing the covariance.
    ///
    /// `dt` is expected to be non-negative; the driver rejects negative steps
    /// before a model ever sees them.
    fn predict(&self, state: &S, dt: f64) -> (S, DMatrix<f64>);
}

/// Linearized transition over the pose tangent layout.
///
/// Velocities are multiplied by `attenuation` (1 for undamped motion) and the
/// attenuated velocities advance position and rotation.
pub(crate) fn pose_transition_matrix(dt: f64, attenuation: f64) -> DMatrix<f64> {
    let mut a = DMatrix::identity(POSE_STATE_DIM, POSE_STATE_DIM);
    for axis in 0..3 {
        a[(POSITION.start + axis, VELOCITY.start + axis)] = attenuation * dt;
        a[(ROTATION.start + axis, ANGULAR_VELOCITY.start + axis)] = attenuation * dt;
        a[(VELOCITY.start + axis, VELOCITY.start + axis)] = attenuation;
        a[(ANGULAR_VELOCITY.start + axis, ANGULAR_VELOCITY.start + axis)] = attenuation;
    }
    a
}

/// Discretized white-noise-acceleration covariance.
///
/// Per axis, for noise density `mu`:
/// `[[mu dt^3 / 3, mu dt^2 / 2], [mu dt^2 / 2, mu dt]]` over (value, rate).
pub(crate) fn pose_process_noise(
    dt: f64,
    position_noise: f64,
    orientation_noise: f64,
) -> DMatrix<f64> {
    let mut q = DMatrix::zeros(POSE_STATE_DIM, POSE_STATE_DIM);
    let dt2 = dt * dt;
    let dt3 = dt2 * dt;
    let blocks = [
        (POSITION.start, VELOCITY.start, position_noise),
        (ROTATION.start, ANGULAR_VELOCITY.start, orientation_noise),
    ];
    for (value, rate, mu) in blocks {
        for axis in 0..3 {
            let (i, j) = (value + axis, rate + axis);
            q[(i, i)] = mu * dt3 / 3.0;
            q[(i, j)] = mu * dt2 / 2.0;
            q[(j, i)] = mu * dt2 / 2.0;
            q[(j, j)] = mu * dt;
        }
    }
    q
}

pub(crate) fn validate_noise_density(name: &'static str, value: f64) -> Result<(), FilterError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidParameter {
            name,
            reason: format!("must be finite and non-negative, got {value}"),
        })
    }
}
