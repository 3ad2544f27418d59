//! # Shared Bandit Bookkeeping
//!
//! Every strategy shares the same housekeeping problem: a fixed set of K arms,
//! a growable set of T query types, per-arm running reward sums for the simple
//! strategies, one reward distribution and one annealed exploration epsilon
//! per type, and warm-up gating that keeps early high-variance normalization
//! from corrupting learned parameters. `BanditCore` owns all of that so the
//! strategy implementations stay focused on their selection/update math.
//!
//! ## Invariants
//!
//! - The arm count K is fixed for the lifetime of the core.
//! - The type count T only grows (`add_query_types`), never shrinks, except
//!   through an explicit `reset`.
//! - Per-type records are stored in an indexed, append-only vector keyed by
//!   type id: appending new types never rebuilds or copies existing entries,
//!   and existing type state is byte-for-byte unaffected by growth.

use serde::{Deserialize, Serialize};
use rand::Rng;

use crate::reward::RewardDistribution;

/// Floor added to arm counts so averages and confidence radii are defined for
/// unseen arms (and unseen arms receive an effectively unbounded UCB bonus).
pub const COUNT_EPSILON: f64 = 1e-7;

/// Shared configuration for exploration and warm-up gating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Initial per-type exploration probability.
    pub exploration_epsilon: f64,
    /// Geometric annealing factor applied to a type's epsilon after every
    /// learning-mode decision that draws for exploration.
    pub anneal_rate: f64,
    /// Minimum raw samples for an (arm, type) pair before normalized rewards
    /// may touch strategy parameters.
    pub warm_up: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            exploration_epsilon: 0.1,
            anneal_rate: 0.99,
            warm_up: 5,
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), crate::CoreError> {
        if !(0.0..=1.0).contains(&self.exploration_epsilon) {
            return Err(crate::CoreError::invalid_config(format!(
                "exploration_epsilon must be in [0, 1], got {}",
                self.exploration_epsilon
            )));
        }
        if !(self.anneal_rate > 0.0 && self.anneal_rate <= 1.0) {
            return Err(crate::CoreError::invalid_config(format!(
                "anneal_rate must be in (0, 1], got {}",
                self.anneal_rate
            )));
        }
        Ok(())
    }
}

/// Per-type learning state: the reward distribution used for normalization
/// and the current (annealed) exploration epsilon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeState {
    pub distribution: RewardDistribution,
    pub epsilon: f64,
    /// Raw-sample counters per arm, used for warm-up gating.
    pub arm_samples: Vec<u64>,
}

impl TypeState {
    fn new(num_arms: usize, epsilon: f64) -> Self {
        Self {
            distribution: RewardDistribution::new(),
            epsilon,
            arm_samples: vec![0; num_arms],
        }
    }
}

/// Arm/type bookkeeping shared by all strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditCore {
    config: CoreConfig,
    num_arms: usize,
    /// Cumulative normalized reward per arm (simple strategies).
    rewards: Vec<f64>,
    /// Observation count per arm (simple strategies).
    counts: Vec<u64>,
    types: Vec<TypeState>,
}

impl BanditCore {
    pub fn new(config: CoreConfig, num_arms: usize, num_types: usize) -> Self {
        let types = (0..num_types)
            .map(|_| TypeState::new(num_arms, config.exploration_epsilon))
            .collect();
        Self {
            config,
            num_arms,
            rewards: vec![0.0; num_arms],
            counts: vec![0; num_arms],
            types,
        }
    }

    pub fn num_arms(&self) -> usize {
        self.num_arms
    }

    pub fn num_types(&self) -> usize {
        self.types.len()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Record a raw reward sample for (arm, type): feeds the type's reward
    /// distribution and bumps the warm-up counter. Always called before any
    /// gated parameter update.
    pub fn record_sample(&mut self, arm: usize, qtype: usize, raw_reward: f64) {
        let state = &mut self.types[qtype];
        state.distribution.add_sample(raw_reward);
        state.arm_samples[arm] += 1;
    }

    /// Whether enough raw samples exist for (arm, type) to let normalized
    /// rewards touch learned parameters.
    pub fn should_update(&self, arm: usize, qtype: usize) -> bool {
        self.types[qtype].arm_samples[arm] as usize >= self.config.warm_up
    }

    /// Normalize a raw reward against the type's accumulated distribution.
    pub fn normalize_reward(&self, qtype: usize, raw_reward: f64) -> f64 {
        self.types[qtype].distribution.normalize(raw_reward)
    }

    /// Draw for exploration against the type's current epsilon, then anneal
    /// it. The epsilon decays after every learning-mode decision regardless
    /// of whether the draw fired.
    pub fn explore_draw<R: Rng + ?Sized>(&mut self, qtype: usize, rng: &mut R) -> bool {
        let state = &mut self.types[qtype];
        let epsilon = state.epsilon;
        state.epsilon *= self.config.anneal_rate;
        rng.gen::<f64>() < epsilon
    }

    pub fn epsilon(&self, qtype: usize) -> f64 {
        self.types[qtype].epsilon
    }

    /// Add normalized reward mass to an arm's running sum.
    pub fn add_reward(&mut self, arm: usize, normalized: f64) {
        self.rewards[arm] += normalized;
        self.counts[arm] += 1;
    }

    pub fn count(&self, arm: usize) -> u64 {
        self.counts[arm]
    }

    /// Average normalized reward for an arm. Unseen arms report the neutral
    /// default 0.0 rather than failing.
    pub fn arm_average(&self, arm: usize) -> f64 {
        self.rewards[arm] / (self.counts[arm] as f64 + COUNT_EPSILON)
    }

    /// Append `n` fresh per-type records. Existing records keep their
    /// accumulated distributions and annealed epsilons untouched.
    pub fn add_query_types(&mut self, n: usize) {
        for _ in 0..n {
            self.types
                .push(TypeState::new(self.num_arms, self.config.exploration_epsilon));
        }
    }

    /// Discard all per-arm and per-type state and reinitialize at the given
    /// type count. The arm count is part of the core's identity and does not
    /// change.
    pub fn reset(&mut self, num_types: usize) {
        self.rewards = vec![0.0; self.num_arms];
        self.counts = vec![0; self.num_arms];
        self.types = (0..num_types)
            .map(|_| TypeState::new(self.num_arms, self.config.exploration_epsilon))
            .collect();
    }

    #[cfg(test)]
    pub(crate) fn type_state(&self, qtype: usize) -> &TypeState {
        &self.types[qtype]
    }
}
