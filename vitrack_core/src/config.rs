// vitrack_core/src/config.rs

//! Deserializable tracker configuration. The core never reads files itself;
//! a host deserializes these from whatever source it uses.

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::estimation::ukf::UkfParams;
use crate::models::process::constant_velocity::{DEFAULT_ORIENTATION_NOISE, DEFAULT_POSITION_NOISE};
use crate::models::process::damped_constant_velocity::DEFAULT_DAMPING;
use crate::models::process::{
    ConstantVelocityProcessModel, DampedConstantVelocityProcessModel, ProcessModel,
};
use crate::state::{PoseState, DEFAULT_INITIAL_VARIANCE};

fn default_position_noise() -> f64 {
    DEFAULT_POSITION_NOISE
}
fn default_orientation_noise() -> f64 {
    DEFAULT_ORIENTATION_NOISE
}
fn default_damping() -> f64 {
    DEFAULT_DAMPING
}
fn default_initial_covariance() -> f64 {
    DEFAULT_INITIAL_VARIANCE
}
fn default_max_consecutive_failures() -> u32 {
    5
}

/// Settings for one [`BodyTracker`](crate::estimation::BodyTracker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    #[serde(default)]
    pub process_model: ProcessModelConfig,
    #[serde(default)]
    pub ukf: UkfParams,
    /// Isotropic variance of a new or reset state.
    #[serde(default = "default_initial_covariance")]
    pub initial_covariance: f64,
    /// Squared Mahalanobis distance above which a measurement is an outlier.
    #[serde(default)]
    pub gate: Option<f64>,
    /// Invalid corrections in a row before the covariance is reset.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            process_model: ProcessModelConfig::default(),
            ukf: UkfParams::default(),
            initial_covariance: default_initial_covariance(),
            gate: None,
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), FilterError> {
        if !(self.initial_covariance.is_finite() && self.initial_covariance > 0.0) {
            return Err(FilterError::InvalidParameter {
                name: "initial_covariance",
                reason: format!("must be finite and positive, got {}", self.initial_covariance),
            });
        }
        if let Some(gate) = self.gate {
            if !(gate > 0.0) {
                return Err(FilterError::InvalidParameter {
                    name: "gate",
                    reason: format!("must be positive, got {gate}"),
                });
            }
        }
        self.ukf.weights(crate::state::layout::POSE_STATE_DIM)?;
        self.process_model.build()?;
        Ok(())
    }
}

/// Selects and parameterizes the motion model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "PascalCase")]
pub enum ProcessModelConfig {
    ConstantVelocity {
        #[serde(default = "default_position_noise")]
        position_noise: f64,
        #[serde(default = "default_orientation_noise")]
        orientation_noise: f64,
    },
    DampedConstantVelocity {
        #[serde(default = "default_position_noise")]
        position_noise: f64,
        #[serde(default = "default_orientation_noise")]
        orientation_noise: f64,
        #[serde(default = "default_damping")]
        damping: f64,
    },
}

impl Default for ProcessModelConfig {
    fn default() -> Self {
        ProcessModelConfig::ConstantVelocity {
            position_noise: DEFAULT_POSITION_NOISE,
            orientation_noise: DEFAULT_ORIENTATION_NOISE,
        }
    }
}

impl ProcessModelConfig {
    pub fn build(&self) -> Result<Box<dyn ProcessModel<PoseState>>, FilterError> {
        Ok(match *self {
            ProcessModelConfig::ConstantVelocity {
                position_noise,
                orientation_noise,
            } => Box::new(ConstantVelocityProcessModel::new(position_noise, orientation_noise)?),
            ProcessModelConfig::DampedConstantVelocity {
                position_noise,
                orientation_noise,
                damping,
            } => Box::new(DampedConstantVelocityProcessModel::new(
                position_noise,
                orientation_noise,
                damping,
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_covariance, 10.0);
        assert_eq!(config.gate, None);
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut config = TrackerConfig::default();
        config.initial_covariance = 0.0;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.gate = Some(-3.0);
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.process_model = ProcessModelConfig::DampedConstantVelocity {
            position_noise: 0.01,
            orientation_noise: 0.1,
            damping: 2.0,
        };
        assert!(matches!(
            config.validate(),
            Err(FilterError::InvalidParameter { name: "damping", .. })
        ));
    }
}
