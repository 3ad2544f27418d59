//! # steer-harness: Experiment Orchestration
//!
//! Ties the bandit core and the SQL analyzer together into runnable
//! experiments: load a JSON configuration, assemble workloads, drive the
//! trial loop for each configured strategy, and write result artifacts plus
//! serialized bandits.
//!
//! ## Module Overview
//!
//! - **`config`**: JSON experiment configuration (workloads, statistics
//!   snapshot, trial counts, strategy roster, seed).
//! - **`workload`**: per-arm query analysis (join order, selectivity) and
//!   profiled best/worst latencies.
//! - **`executor`**: the `execute(rewrite) -> elapsed` seam, with the
//!   profile-replaying simulation implementation.
//! - **`sequence`**: reproducible, balanced per-trial query-type sequences.
//! - **`trial`**: the trial loop itself (featurize, select, execute, update,
//!   record), including the warm-up trial policy.
//! - **`experiment`**: per-strategy train/test phases and artifact output.

pub mod config;
pub mod error;
pub mod executor;
pub mod experiment;
pub mod output;
pub mod sequence;
pub mod trial;
pub mod workload;

pub use config::{ExperimentConfig, WorkloadQuery};
pub use error::HarnessError;
pub use executor::{Executor, ProfiledExecutor};
pub use experiment::run_experiment;
pub use trial::{run_phase, PhaseMode, TrialRecord};
pub use workload::{Arm, QueryType, Workload};
