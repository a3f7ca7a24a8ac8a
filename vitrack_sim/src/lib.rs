// vitrack_sim/src/lib.rs

//! Headless synthetic-scenario driver for `vitrack_core`.

// This prelude is for convenience for other files WITHIN the vitrack_sim crate.
pub mod prelude;

pub mod cli;
pub mod error;
pub mod simulation;

use crate::cli::Cli;
use crate::error::SimError;
use crate::simulation::config::{load_scenario, ScenarioConfig};

/// Loads the scenario named on the command line and applies the overrides.
pub fn resolve_scenario(cli: &Cli) -> Result<ScenarioConfig, SimError> {
    let mut config = load_scenario(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        config.simulation.seed = seed;
    }
    if let Some(duration) = cli.duration {
        config.simulation.duration_seconds = duration;
    }
    config.validate()?;
    Ok(config)
}
