//! # Trial Loop
//!
//! Drives one phase (training or testing) of an experiment: for each trial,
//! pick the query type from the pre-generated sequence, featurize its arms,
//! ask the strategy for an arm, execute the chosen rewrite, and feed the
//! negated latency back as reward.
//!
//! Trial 0 is a warm-up: it executes the scheduled type's first arm to warm
//! caches and connections, and is excluded from *all* bookkeeping. No arm is
//! selected (so no epsilon anneals), no reward is recorded, and no record is
//! emitted; phase output covers trials `1..=trials` only.

use rand::Rng;
use serde::{Deserialize, Serialize};

use steer_core::{Bandit, ContextVector};
use steer_sql::featurize;
use steer_sql::Catalog;

use crate::error::HarnessError;
use crate::executor::Executor;
use crate::workload::{QueryType, Workload};

/// How a phase treats the strategy: training explores and learns, testing
/// exploits and (by default) freezes parameters.
#[derive(Debug, Clone, Copy)]
pub struct PhaseMode {
    pub exploit: bool,
    pub learn: bool,
}

impl PhaseMode {
    pub fn training() -> Self {
        Self { exploit: false, learn: true }
    }

    pub fn testing(update_during_testing: bool) -> Self {
        Self { exploit: true, learn: update_during_testing }
    }
}

/// Everything recorded about one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub elapsed_time: f64,
    pub normalized_reward: f64,
    /// Elapsed latency rescaled against the type's best/worst profiled
    /// average, clamped to [0, 1]. Zero when best and worst coincide.
    pub regret: f64,
    pub arm: usize,
    pub query_type: usize,
    pub best_arm: usize,
    pub best_average: f64,
}

fn arm_contexts(qt: &QueryType, catalog: &dyn Catalog) -> Vec<ContextVector> {
    // Each arm is featurized from its own analyzed join order and selectivity
    // map. Arms that differ only in forced join implementation end up with
    // equal contexts; arms with distinct join orders get distinct vectors,
    // which is what lets the contextual strategies separate them.
    qt.arms
        .iter()
        .map(|arm| featurize::combine(&arm.shape, catalog, &arm.selectivity))
        .collect()
}

fn regret(elapsed: f64, qt: &QueryType) -> f64 {
    if qt.worst_average > qt.best_average {
        ((elapsed - qt.best_average) / (qt.worst_average - qt.best_average)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Run one phase over a pre-generated type sequence and return its per-trial
/// records in order.
pub fn run_phase<R: Rng>(
    bandit: &mut Bandit,
    workload: &Workload,
    catalog: &dyn Catalog,
    executor: &mut dyn Executor,
    sequence: &[usize],
    mode: PhaseMode,
    rng: &mut R,
) -> Result<Vec<TrialRecord>, HarnessError> {
    let mut records = Vec::with_capacity(sequence.len().saturating_sub(1));

    for (trial, &query_type) in sequence.iter().enumerate() {
        let qt = &workload.types[query_type];

        if trial == 0 {
            executor.execute(query_type, &qt.arms[0].sql, rng)?;
            continue;
        }

        let contexts = arm_contexts(qt, catalog);
        let arm = bandit.select_arm(trial, query_type, &contexts, mode.exploit, rng);
        let elapsed = executor.execute(query_type, &qt.arms[arm].sql, rng)?;

        // Normalize against the distribution as it stood at selection time,
        // then let the update fold the new sample in.
        let normalized_reward = bandit.normalize_reward(query_type, -elapsed);
        if mode.learn {
            bandit.update(arm, query_type, -elapsed, &contexts);
        }

        records.push(TrialRecord {
            elapsed_time: elapsed,
            normalized_reward,
            regret: regret(elapsed, qt),
            arm,
            query_type,
            best_arm: qt.best_arm,
            best_average: qt.best_average,
        });
    }

    tracing::debug!(
        strategy = %bandit.name(),
        trials = records.len(),
        exploit = mode.exploit,
        "phase complete"
    );
    Ok(records)
}
