//! Construction and configuration errors for the bandit core.
//!
//! These are all setup-time failures: a misconfigured strategy must be rejected
//! before any trial runs. Per-trial numeric edge cases (empty sample sets, zero
//! counts) are handled with documented defaults and never surface as errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A strategy hyperparameter is outside its valid range.
    #[error("invalid strategy configuration: {message}")]
    InvalidConfig { message: String },

    /// The ridge design matrix would not be invertible. Rejected at
    /// construction: a positive regularization term keeps the matrix
    /// invertible for the lifetime of the optimizer, so invertibility is
    /// never a per-trial concern.
    #[error("design matrix would be singular: ridge lambda must be positive, got {lambda}")]
    SingularDesignMatrix { lambda: f64 },
}

impl CoreError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }
}
