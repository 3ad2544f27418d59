//! Command-line entry point: run every experiment in a configuration file.
//!
//! Usage: `steer-harness <config.json>`. Logging is controlled by the
//! `RUST_LOG` environment variable (defaults to `steer=info`).

use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use steer_harness::{config, run_experiment, HarnessError};

fn run() -> Result<(), HarnessError> {
    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| HarnessError::config("usage: steer-harness <config.json>"))?;

    for experiment in config::load(&path)? {
        tracing::info!(name = %experiment.name, "running experiment");
        run_experiment(&experiment)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("steer=info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "experiment failed");
            ExitCode::FAILURE
        }
    }
}
