// vitrack_core/src/models/process/constant_velocity.rs

use super::{pose_process_noise, pose_transition_matrix, validate_noise_density, ProcessModel};
use crate::error::FilterError;
use crate::state::PoseState;
use crate::utils::exp_map::rotation_vector_to_quat;
use nalgebra::{DMatrix, UnitQuaternion};

pub const DEFAULT_POSITION_NOISE: f64 = 0.01;
pub const DEFAULT_ORIENTATION_NOISE: f64 = 0.1;

/// Constant linear and angular velocity, driven by white acceleration noise.
///
/// Position advances by `velocity * dt`; orientation advances by the rotation
/// vector `angular_velocity * dt`, composed on the left (world frame).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantVelocityProcessModel {
    /// Acceleration noise density for position, (m/s^2)^2 / Hz.
    position_noise: f64,
    /// Angular acceleration noise density, (rad/s^2)^2 / Hz.
    orientation_noise: f64,
}

impl Default for ConstantVelocityProcessModel {
    fn default() -> Self {
        Self {
            position_noise: DEFAULT_POSITION_NOISE,
            orientation_noise: DEFAULT_ORIENTATION_NOISE,
        }
    }
}

impl ConstantVelocityProcessModel {
    pub fn new(position_noise: f64, orientation_noise: f64) -> Result<Self, FilterError> {
        validate_noise_density("position_noise", position_noise)?;
        validate_noise_density("orientation_noise", orientation_noise)?;
        Ok(Self {
            position_noise,
            orientation_noise,
        })
    }

    pub fn position_noise(&self) -> f64 {
        self.position_noise
    }

    pub fn orientation_noise(&self) -> f64 {
        self.orientation_noise
    }

    /// The additive process noise for a step of `dt` seconds.
    pub fn noise(&self, dt: f64) -> DMatrix<f64> {
        pose_process_noise(dt, self.position_noise, self.orientation_noise)
    }
}

/// Advances the mean of `state` under constant velocity, in place.
pub(crate) fn advance_mean(state: &mut PoseState, dt: f64) {
    state.position += state.velocity * dt;
    let step = rotation_vector_to_quat(&(state.angular_velocity * dt));
    state.orientation = UnitQuaternion::new_normalize((step * state.orientation).into_inner());
}

impl ProcessModel<PoseState> for ConstantVelocityProcessModel {
    fn predict(&self, state: &PoseState, dt: f64) -> (PoseState, DMatrix<f64>) {
        let mut predicted = state.clone();
        advance_mean(&mut predicted, dt);

        let a = pose_transition_matrix(dt, 1.0);
        predicted.covariance = &a * &state.covariance * a.transpose();

        (predicted, self.noise(dt))
    }
}
