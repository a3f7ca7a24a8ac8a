// vitrack_sim/src/error.rs

use std::path::PathBuf;

use thiserror::Error;
use vitrack_core::error::FilterError;

/// Everything that can stop a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("scenario file not found: {0}")]
    ScenarioNotFound(PathBuf),

    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("failed to render scenario: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid sensor noise: {0}")]
    Noise(#[from] rand_distr::NormalError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}
