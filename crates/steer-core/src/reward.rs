//! # Online Reward Normalization
//!
//! Raw rewards are negated execution latencies, so their scale varies wildly
//! across query shapes: a three-way join over large tables produces rewards
//! around -2000ms while a small two-way join sits near -40ms. Feeding those
//! directly into one set of strategy hyperparameters would make the learner's
//! behavior depend on absolute latency scale.
//!
//! `RewardDistribution` fixes this by accumulating each query type's raw
//! samples online and normalizing through the Gaussian CDF of the accumulated
//! mean and variance:
//!
//! ```text
//! normalize(x) = CDF_{N(mean, var)}(x) - 1    in [-1, 0]
//! ```
//!
//! The output is bounded and monotone non-decreasing in the raw reward, so a
//! faster-than-usual execution for a type always maps to a larger (less
//! negative) normalized reward, regardless of that type's absolute scale.
//!
//! The variance is floored by a small constant to avoid a degenerate
//! distribution when all samples coincide, and an empty accumulator falls back
//! to a standard default so that normalization never fails.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Variance reported before any sample has been recorded.
pub const DEFAULT_VARIANCE: f64 = 0.1;

/// Constant added to the accumulated squared deviations so the variance of a
/// constant sample set stays strictly positive.
pub const VARIANCE_FLOOR: f64 = 0.1;

/// Online accumulator of raw reward samples for one query type.
///
/// Uses Welford's algorithm so the accumulator stays O(1) in memory while
/// remaining exactly serializable (count, mean, and M2 round-trip through
/// serde without loss).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardDistribution {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RewardDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw reward sample. Every observed reward is recorded,
    /// independent of any warm-up gating applied to parameter updates.
    pub fn add_sample(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn num_samples(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            DEFAULT_VARIANCE
        } else {
            (VARIANCE_FLOOR + self.m2) / self.count as f64
        }
    }

    /// Map a raw reward onto `[-1, 0]` via the Gaussian CDF of the
    /// accumulated sample distribution.
    pub fn normalize(&self, x: f64) -> f64 {
        let dist = Normal::new(self.mean(), self.variance().sqrt())
            .expect("variance is floored to a positive value");
        dist.cdf(x) - 1.0
    }
}
