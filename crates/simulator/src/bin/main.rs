//! Contention simulator CLI
//!
//! Runs `num_clients` stations from the configuration file against the
//! arbiter it names, using one MAC protocol for all of them.
//!
//! # Example
//!
//! ```bash
//! contend-sim beb --config config.json --output-dir out
//! RUST_LOG=contend_station=debug contend-sim sensing --seed 42 --time-budget 30s
//! ```

use anyhow::Context;
use clap::Parser;
use contend_simulator::SimulationRunner;
use contend_types::{Protocol, SimulationConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shared-channel contention simulator
#[derive(Parser, Debug)]
#[command(name = "contend-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// MAC protocol: aloha, beb or sensing
    protocol: Protocol,

    /// Configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Directory for per-station output files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Stop all stations after this long (e.g., "30s", "5m")
    #[arg(long)]
    time_budget: Option<humantime::Duration>,

    /// Base seed for reproducible runs; overrides the config file
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = SimulationConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut runner = SimulationRunner::new(config, args.protocol)
        .context("invalid configuration")?
        .with_output_dir(args.output_dir);
    if let Some(budget) = args.time_budget {
        runner = runner.with_time_budget(*budget);
    }

    let report = runner.run().await;
    report.print();

    Ok(())
}
