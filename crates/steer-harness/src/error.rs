//! Harness error taxonomy.
//!
//! Setup-time errors (configuration, parsing, arm enumeration, profile
//! validation) abort the whole experiment before any output artifact is
//! produced. The one per-trial error is `ExecutionFailure`: a trial that
//! cannot produce a timing aborts the run rather than recording a fabricated
//! latency, since a made-up zero would corrupt the reward distribution.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid experiment configuration: {message}")]
    Config { message: String },

    #[error("failed to read configuration file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Analyzer(#[from] steer_sql::AnalyzerError),

    #[error(transparent)]
    Core(#[from] steer_core::CoreError),

    /// No latency could be produced for a rewrite. Never substituted with a
    /// zero.
    #[error("no profiled latency for query type {query_type}, rewrite: {rewrite}")]
    ExecutionFailure { query_type: usize, rewrite: String },

    #[error("failed to write output artifact {path}: {source}")]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }
}
