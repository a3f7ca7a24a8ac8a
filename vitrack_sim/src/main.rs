// vitrack_sim/src/main.rs

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vitrack_sim::cli::Cli;
use vitrack_sim::prelude::*;
use vitrack_sim::resolve_scenario;

fn run(cli: &Cli) -> Result<(), SimError> {
    let config = resolve_scenario(cli)?;
    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }
    let summary = SimulationRunner::new(config)?.run()?;
    if !summary.final_estimate_trustworthy {
        error!("final estimate of '{}' contains non-finite values", summary.body);
    }
    info!(
        "Max Pos Err: {:.4}m | Max Att Err: {:.3}°",
        summary.errors.max_position, summary.errors.max_attitude_deg
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "debug,vitrack_core=debug"
    } else {
        "info,vitrack_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
