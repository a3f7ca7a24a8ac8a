// vitrack_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// vitrack_sim: a headless scenario driver for the vitrack pose tracker.
///
/// Generates noisy camera and gyro readings of a known motion, feeds them to a
/// body tracker and reports how far the estimate strays from the truth.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/default.toml")]
    pub scenario: PathBuf,

    /// Overrides the scenario's random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Overrides the scenario's duration, in seconds.
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Log at debug level (per-measurement outcomes). `RUST_LOG` wins if set.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Print the fully resolved scenario as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}
