//! # Strategy Library
//!
//! Six selection/update algorithms over the shared [`BanditCore`]:
//!
//! | Strategy          | Context use | Exploration mechanism                  |
//! |-------------------|-------------|----------------------------------------|
//! | Random            | none        | uniform draw (the policy itself)       |
//! | EpsilonGreedy     | none        | annealed per-type epsilon draw         |
//! | UCB               | none        | confidence radius, no random draw      |
//! | LinUCB            | ridge       | confidence radius, no random draw      |
//! | LinearThompson    | posterior   | posterior sampling + epsilon floor     |
//! | EXP4              | experts     | sampled arm distribution + eps floor   |
//!
//! Strategies are resolved once, at construction, from the closed
//! [`StrategyConfig`] enum: an unknown strategy name fails configuration
//! deserialization instead of silently falling through to a default.
//!
//! The [`Bandit`] enum is the runtime representation. It serializes as one
//! opaque unit; a deserialized bandit reproduces bit-for-bit identical
//! `select_arm`/`update` behavior given the same subsequent inputs and the
//! same caller-supplied RNG state.

mod epsilon_greedy;
mod exp4;
mod linucb;
mod random;
mod thompson;
mod ucb;

pub use epsilon_greedy::EpsilonGreedy;
pub use exp4::Exp4;
pub use linucb::LinUcb;
pub use random::Random;
pub use thompson::LinearThompson;
pub use ucb::Ucb;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::ContextVector;
use crate::error::CoreError;
use crate::optimizer::{BanditCore, CoreConfig};

/// Closed set of strategy configurations.
///
/// Deserializes from tagged JSON, e.g.
/// `{"type": "lin_ucb", "dim": 8, "alpha": 1.0, "lambda": 0.1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    Random,
    EpsilonGreedy { epsilon: f64 },
    Ucb,
    LinUcb { dim: usize, alpha: f64, lambda: f64 },
    LinearThompson { dim: usize, radius: f64, delta: f64 },
    Exp4 { num_experts: usize, nu: f64, gamma: f64 },
}

impl StrategyConfig {
    /// Resolve the configuration into a concrete strategy.
    ///
    /// Hyperparameters are validated here, before any trial runs: a
    /// non-positive ridge term would make the design matrix singular at the
    /// first inversion, so it is rejected as a setup error.
    pub fn build(
        &self,
        core_config: CoreConfig,
        num_arms: usize,
        num_types: usize,
    ) -> Result<Bandit, CoreError> {
        core_config.validate()?;
        if num_arms == 0 {
            return Err(CoreError::invalid_config("num_arms must be positive"));
        }

        let bandit = match *self {
            StrategyConfig::Random => {
                Bandit::Random(Random::new(core_config, num_arms, num_types))
            }
            StrategyConfig::EpsilonGreedy { epsilon } => {
                if !(0.0..=1.0).contains(&epsilon) {
                    return Err(CoreError::invalid_config(format!(
                        "epsilon must be in [0, 1], got {epsilon}"
                    )));
                }
                // The strategy's epsilon seeds the per-type annealed value.
                let core_config = CoreConfig { exploration_epsilon: epsilon, ..core_config };
                Bandit::EpsilonGreedy(EpsilonGreedy::new(core_config, num_arms, num_types))
            }
            StrategyConfig::Ucb => Bandit::Ucb(Ucb::new(core_config, num_arms, num_types)),
            StrategyConfig::LinUcb { dim, alpha, lambda } => {
                if lambda <= 0.0 {
                    return Err(CoreError::SingularDesignMatrix { lambda });
                }
                if dim == 0 {
                    return Err(CoreError::invalid_config("context dim must be positive"));
                }
                Bandit::LinUcb(LinUcb::new(core_config, num_arms, num_types, dim, alpha, lambda))
            }
            StrategyConfig::LinearThompson { dim, radius, delta } => {
                if !(0.0 < delta && delta < 1.0) {
                    return Err(CoreError::invalid_config(format!(
                        "delta must be in (0, 1), got {delta}"
                    )));
                }
                if dim == 0 {
                    return Err(CoreError::invalid_config("context dim must be positive"));
                }
                Bandit::LinearThompson(LinearThompson::new(
                    core_config, num_arms, num_types, dim, radius, delta,
                ))
            }
            StrategyConfig::Exp4 { num_experts, nu, gamma } => {
                if num_experts == 0 {
                    return Err(CoreError::invalid_config("num_experts must be positive"));
                }
                if gamma < 0.0 {
                    return Err(CoreError::invalid_config(format!(
                        "gamma must be non-negative, got {gamma}"
                    )));
                }
                Bandit::Exp4(Exp4::new(core_config, num_arms, num_types, num_experts, nu, gamma))
            }
        };
        Ok(bandit)
    }
}

/// A fully constructed bandit optimizer.
///
/// The `contexts` slice passed to [`select_arm`](Bandit::select_arm) and
/// [`update`](Bandit::update) is ordered by arm index; callers must keep that
/// ordering consistent with their arm-indexed reward bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Bandit {
    Random(Random),
    EpsilonGreedy(EpsilonGreedy),
    Ucb(Ucb),
    LinUcb(LinUcb),
    LinearThompson(LinearThompson),
    Exp4(Exp4),
}

impl Bandit {
    /// Choose an arm for the given trial time and query type.
    ///
    /// With `exploit = true` the result is a deterministic function of the
    /// accumulated state: no exploration draw is made and no state mutates,
    /// so the call is safe for held-out evaluation.
    pub fn select_arm<R: Rng + ?Sized>(
        &mut self,
        time: usize,
        qtype: usize,
        contexts: &[ContextVector],
        exploit: bool,
        rng: &mut R,
    ) -> usize {
        let arm = match self {
            Bandit::Random(s) => s.select_arm(time, exploit, rng),
            Bandit::EpsilonGreedy(s) => s.select_arm(qtype, exploit, rng),
            Bandit::Ucb(s) => s.select_arm(time),
            Bandit::LinUcb(s) => s.select_arm(contexts),
            Bandit::LinearThompson(s) => s.select_arm(time, qtype, contexts, exploit, rng),
            Bandit::Exp4(s) => s.select_arm(qtype, contexts, exploit, rng),
        };
        tracing::trace!(strategy = %self.name(), time, qtype, arm, exploit, "selected arm");
        arm
    }

    /// Feed back a raw reward (conventionally the negated elapsed latency).
    ///
    /// The raw sample always reaches the type's reward distribution; learned
    /// parameters only move once the (arm, type) pair has passed warm-up, and
    /// then only with the normalized reward.
    pub fn update(&mut self, arm: usize, qtype: usize, raw_reward: f64, contexts: &[ContextVector]) {
        match self {
            Bandit::Random(s) => s.update(arm, qtype, raw_reward),
            Bandit::EpsilonGreedy(s) => s.update(arm, qtype, raw_reward),
            Bandit::Ucb(s) => s.update(arm, qtype, raw_reward),
            Bandit::LinUcb(s) => s.update(arm, qtype, raw_reward, contexts),
            Bandit::LinearThompson(s) => s.update(arm, qtype, raw_reward, contexts),
            Bandit::Exp4(s) => s.update(arm, qtype, raw_reward, contexts),
        }
    }

    /// Normalize a raw reward against the query type's accumulated
    /// distribution without recording it.
    pub fn normalize_reward(&self, qtype: usize, raw_reward: f64) -> f64 {
        self.core().normalize_reward(qtype, raw_reward)
    }

    /// Algorithm name plus hyperparameters, used as a persistence key.
    pub fn name(&self) -> String {
        match self {
            Bandit::Random(_) => "Random".to_string(),
            Bandit::EpsilonGreedy(s) => s.name(),
            Bandit::Ucb(_) => "UCB".to_string(),
            Bandit::LinUcb(s) => s.name(),
            Bandit::LinearThompson(s) => s.name(),
            Bandit::Exp4(s) => s.name(),
        }
    }

    /// Append `n` fresh query types without disturbing existing ones.
    pub fn add_query_types(&mut self, n: usize) {
        self.core_mut().add_query_types(n);
    }

    /// Discard all learned state and reinitialize at the given type count.
    pub fn reset(&mut self, num_types: usize) {
        match self {
            Bandit::Random(s) => s.reset(num_types),
            Bandit::EpsilonGreedy(s) => s.reset(num_types),
            Bandit::Ucb(s) => s.reset(num_types),
            Bandit::LinUcb(s) => s.reset(num_types),
            Bandit::LinearThompson(s) => s.reset(num_types),
            Bandit::Exp4(s) => s.reset(num_types),
        }
    }

    pub fn num_arms(&self) -> usize {
        self.core().num_arms()
    }

    pub fn num_types(&self) -> usize {
        self.core().num_types()
    }

    pub fn core(&self) -> &BanditCore {
        match self {
            Bandit::Random(s) => s.core(),
            Bandit::EpsilonGreedy(s) => s.core(),
            Bandit::Ucb(s) => s.core(),
            Bandit::LinUcb(s) => s.core(),
            Bandit::LinearThompson(s) => s.core(),
            Bandit::Exp4(s) => s.core(),
        }
    }

    fn core_mut(&mut self) -> &mut BanditCore {
        match self {
            Bandit::Random(s) => s.core_mut(),
            Bandit::EpsilonGreedy(s) => s.core_mut(),
            Bandit::Ucb(s) => s.core_mut(),
            Bandit::LinUcb(s) => s.core_mut(),
            Bandit::LinearThompson(s) => s.core_mut(),
            Bandit::Exp4(s) => s.core_mut(),
        }
    }
}
