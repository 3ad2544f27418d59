//! # Query Execution
//!
//! The trial loop only consumes `execute(rewrite) -> elapsed milliseconds`;
//! the `Executor` trait is that seam. `ProfiledExecutor` is the simulation
//! implementation: it replays latencies recorded by profiling each rewrite
//! against the real database ahead of time, which makes experiments fast and
//! exactly reproducible.
//!
//! A missing profile entry is a hard failure. Returning a made-up latency
//! (zero or otherwise) would feed a fabricated sample into the reward
//! distribution and silently corrupt every normalization after it.

use rand::{Rng, RngCore};
use std::collections::HashMap;

use crate::error::HarnessError;
use crate::workload::Workload;

/// Produces an elapsed latency (milliseconds) for one rewrite of one query
/// type.
pub trait Executor {
    fn execute(
        &mut self,
        query_type: usize,
        rewrite: &str,
        rng: &mut dyn RngCore,
    ) -> Result<f64, HarnessError>;
}

/// Replays pre-recorded latencies, drawn uniformly per call, keyed by exact
/// rewrite text.
#[derive(Debug, Clone)]
pub struct ProfiledExecutor {
    profiles: Vec<HashMap<String, Vec<f64>>>,
}

impl ProfiledExecutor {
    pub fn from_workload(workload: &Workload) -> Self {
        Self {
            profiles: workload.types.iter().map(|t| t.latencies.clone()).collect(),
        }
    }
}

impl Executor for ProfiledExecutor {
    fn execute(
        &mut self,
        query_type: usize,
        rewrite: &str,
        rng: &mut dyn RngCore,
    ) -> Result<f64, HarnessError> {
        let samples = self
            .profiles
            .get(query_type)
            .and_then(|p| p.get(rewrite))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| HarnessError::ExecutionFailure {
                query_type,
                rewrite: rewrite.to_string(),
            })?;
        let elapsed = samples[rng.gen_range(0..samples.len())];
        tracing::trace!(query_type, elapsed, "sampled profiled latency");
        Ok(elapsed)
    }
}
