//! Setup-time analysis errors.
//!
//! Everything here is fatal before any arm is enumerated: all of a query
//! type's rewrites must exist up front, so a template the analyzer cannot
//! handle aborts the experiment configuration. Missing statistics are *not*
//! errors -- the featurizer and selectivity estimator substitute neutral
//! defaults instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The template is not parseable SQL.
    #[error("failed to parse query template: {0}")]
    Parse(#[from] sqlparser::parser::ParserError),

    /// Parsed, but not the single-SELECT shape the analyzer expects.
    #[error("malformed query template: {message}")]
    MalformedQuery { message: String },

    /// Rewrite enumeration would produce 2^k arms for an unreasonable k.
    #[error("template has {joins} sequential joins; enumeration is capped at {max} (2^k arms)")]
    TooManyJoins { joins: usize, max: usize },
}

impl AnalyzerError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedQuery { message: message.into() }
    }
}
