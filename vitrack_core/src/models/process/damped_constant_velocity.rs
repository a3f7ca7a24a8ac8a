// vitrack_core/src/models/process/damped_constant_velocity.rs

use super::constant_velocity::{advance_mean, DEFAULT_ORIENTATION_NOISE, DEFAULT_POSITION_NOISE};
use super::{pose_process_noise, pose_transition_matrix, validate_noise_density, ProcessModel};
use crate::error::FilterError;
use crate::state::PoseState;
use nalgebra::DMatrix;

/// Fraction of velocity that survives one second of prediction.
pub const DEFAULT_DAMPING: f64 = 0.3;

/// Constant velocity with exponential decay of both velocities.
///
/// Over a step of `dt` seconds the velocities are first scaled by
/// `damping^dt` and then used to advance position and orientation. This keeps a
/// velocity estimate from running away while measurements are sparse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampedConstantVelocityProcessModel {
    position_noise: f64,
    orientation_noise: f64,
    damping: f64,
}

impl Default for DampedConstantVelocityProcessModel {
    fn default() -> Self {
        Self {
            position_noise: DEFAULT_POSITION_NOISE,
            orientation_noise: DEFAULT_ORIENTATION_NOISE,
            damping: DEFAULT_DAMPING,
        }
    }
}

impl DampedConstantVelocityProcessModel {
    /// `damping` must lie in `(0, 1]`; 1 disables damping.
    pub fn new(
        position_noise: f64,
        orientation_noise: f64,
        damping: f64,
    ) -> Result<Self, FilterError> {
        validate_noise_density("position_noise", position_noise)?;
        validate_noise_density("orientation_noise", orientation_noise)?;
        if !(damping > 0.0 && damping <= 1.0) {
            return Err(FilterError::InvalidParameter {
                name: "damping",
                reason: format!("must lie in (0, 1], got {damping}"),
            });
        }
        Ok(Self {
            position_noise,
            orientation_noise,
            damping,
        })
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// `damping^dt`
    pub fn attenuation(&self, dt: f64) -> f64 {
        self.damping.powf(dt)
    }

    pub fn noise(&self, dt: f64) -> DMatrix<f64> {
        pose_process_noise(dt, self.position_noise, self.orientation_noise)
    }
}

impl ProcessModel<PoseState> for DampedConstantVelocityProcessModel {
    fn predict(&self, state: &PoseState, dt: f64) -> (PoseState, DMatrix<f64>) {
        let attenuation = self.attenuation(dt);

        let mut predicted = state.clone();
        predicted.velocity *= attenuation;
        predicted.angular_velocity *= attenuation;
        advance_mean(&mut predicted, dt);

        let a = pose_transition_matrix(dt, attenuation);
        predicted.covariance = &a * &state.covariance * a.transpose();

        (predicted, self.noise(dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::process::ConstantVelocityProcessModel;
    use approx::assert_abs_diff_eq;
    use crate::utils::exp_map::angular_distance;
    use nalgebra::Vector3;

    #[test]
    fn velocities_decay_by_damping_per_second() {
        let model = DampedConstantVelocityProcessModel::default();
        let state = PoseState::new()
            .with_velocity(Vector3::new(1.0, 0.0, 0.0))
            .with_angular_velocity(Vector3::new(0.0, 2.0, 0.0));
        let (predicted, _) = model.predict(&state, 1.0);
        assert_abs_diff_eq!(predicted.velocity.x, 0.3, epsilon = 1e-15);
        assert_abs_diff_eq!(predicted.angular_velocity.y, 0.6, epsilon = 1e-15);
        // Position moves with the attenuated velocity.
        assert_abs_diff_eq!(predicted.position.x, 0.3, epsilon = 1e-15);
    }

    #[test]
    fn repeated_small_steps_match_one_large_step_in_velocity() {
        let model = DampedConstantVelocityProcessModel::default();
        let mut state = PoseState::new().with_velocity(Vector3::new(2.0, 0.0, 0.0));
        for _ in 0..100 {
            state = model.predict(&state, 0.01).0;
        }
        assert_abs_diff_eq!(state.velocity.x, 2.0 * 0.3, epsilon = 1e-12);
    }

    #[test]
    fn unit_damping_matches_constant_velocity() {
        let damped = DampedConstantVelocityProcessModel::new(0.01, 0.1, 1.0).unwrap();
        let plain = ConstantVelocityProcessModel::default();
        let state = PoseState::new()
            .with_velocity(Vector3::new(0.3, 0.2, 0.1))
            .with_angular_velocity(Vector3::new(0.5, 0.0, -0.5));
        let (a, qa) = damped.predict(&state, 0.05);
        let (b, qb) = plain.predict(&state, 0.05);
        assert_abs_diff_eq!(a.position, b.position, epsilon = 1e-15);
        assert_abs_diff_eq!(angular_distance(&a.orientation, &b.orientation), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.covariance, b.covariance, epsilon = 1e-15);
        assert_abs_diff_eq!(qa, qb, epsilon = 1e-18);
    }

    #[test]
    fn covariance_transition_carries_attenuation() {
        let model = DampedConstantVelocityProcessModel::default();
        let mut state = PoseState::new();
        state.reset_covariance(1.0);
        let (predicted, _) = model.predict(&state, 1.0);
        assert_abs_diff_eq!(predicted.covariance[(6, 6)], 0.09, epsilon = 1e-15);
        assert_abs_diff_eq!(predicted.covariance[(0, 0)], 1.09, epsilon = 1e-15);
    }

    #[test]
    fn damping_outside_unit_interval_is_rejected() {
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let err = DampedConstantVelocityProcessModel::new(0.01, 0.1, bad).unwrap_err();
            assert!(matches!(err, FilterError::InvalidParameter { name: "damping", .. }));
        }
    }
}
