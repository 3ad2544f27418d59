//! EXP4: exponential weighting over per-feature experts.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::{argmax, normalize_columns, sample_distribution, stack_contexts, ContextVector};
use crate::optimizer::{BanditCore, CoreConfig};

/// EXP4 with one expert per context feature dimension.
///
/// Each column of the stacked K×M context matrix, normalized to unit sum, is
/// read as one expert's advice: a probability distribution over arms. The
/// strategy keeps a weight per expert (initialized uniform, always summing to
/// one) and plays the weight-mixed advice distribution -- sampled from during
/// learning, argmax'd in exploit mode.
///
/// ## Reward sign convention
///
/// Unlike every other strategy here, the EXP4 weight update works with rewards
/// in `[0, 1]`: the shared normalizer's `[-1, 0]` output is shifted by +1
/// before it enters the importance-weighted estimate. The estimate for the
/// chosen arm is `reward / (P(chosen) + gamma)` and exactly 0 for all other
/// arms; gamma is a fixed floor that keeps the estimate bounded as the played
/// probability approaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exp4 {
    nu: f64,
    gamma: f64,
    num_experts: usize,
    weights: DVector<f64>,
    core: BanditCore,
}

impl Exp4 {
    pub fn new(
        config: CoreConfig,
        num_arms: usize,
        num_types: usize,
        num_experts: usize,
        nu: f64,
        gamma: f64,
    ) -> Self {
        Self {
            nu,
            gamma,
            num_experts,
            weights: DVector::from_element(num_experts, 1.0 / num_experts as f64),
            core: BanditCore::new(config, num_arms, num_types),
        }
    }

    /// Mix the experts' advice into an arm probability distribution.
    fn arm_distribution(&self, contexts: &[ContextVector]) -> (DMatrix<f64>, Vec<f64>) {
        let mut stacked = stack_contexts(contexts);
        normalize_columns(&mut stacked);

        let mixed = &stacked * &self.weights;
        let total: f64 = mixed.iter().sum();
        let probs = if total.abs() > f64::EPSILON {
            mixed.iter().map(|p| p / total).collect()
        } else {
            vec![1.0 / contexts.len() as f64; contexts.len()]
        };
        (stacked, probs)
    }

    pub fn select_arm<R: Rng + ?Sized>(
        &mut self,
        qtype: usize,
        contexts: &[ContextVector],
        exploit: bool,
        rng: &mut R,
    ) -> usize {
        let (_, probs) = self.arm_distribution(contexts);
        if exploit {
            return argmax(&probs);
        }
        if self.core.explore_draw(qtype, rng) {
            return rng.gen_range(0..self.core.num_arms());
        }
        sample_distribution(&probs, rng)
    }

    pub fn update(&mut self, arm: usize, qtype: usize, raw_reward: f64, contexts: &[ContextVector]) {
        self.core.record_sample(arm, qtype, raw_reward);
        if !self.core.should_update(arm, qtype) {
            return;
        }
        // Shift the [-1, 0] normalized reward into this strategy's [0, 1]
        // convention.
        let reward = self.core.normalize_reward(qtype, raw_reward) + 1.0;

        let (stacked, probs) = self.arm_distribution(contexts);

        // Importance-weighted reward estimate per arm: only the played arm
        // carries information; unplayed arms contribute nothing.
        let mut action_rewards = DVector::zeros(contexts.len());
        action_rewards[arm] = reward / (probs[arm] + self.gamma);

        // Credit each expert by how much advice mass it put on the played arm.
        let expert_rewards = stacked.transpose() * action_rewards;

        for i in 0..self.num_experts {
            self.weights[i] *= (self.nu * expert_rewards[i]).exp();
        }
        let total: f64 = self.weights.iter().sum();
        if total > f64::EPSILON {
            self.weights /= total;
        } else {
            self.weights = DVector::from_element(self.num_experts, 1.0 / self.num_experts as f64);
        }
    }

    pub fn name(&self) -> String {
        format!("EXP4-{:.3}-{:.3}", self.nu, self.gamma)
    }

    pub fn reset(&mut self, num_types: usize) {
        self.weights = DVector::from_element(self.num_experts, 1.0 / self.num_experts as f64);
        self.core.reset(num_types);
    }

    pub fn core(&self) -> &BanditCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut BanditCore {
        &mut self.core
    }
}
