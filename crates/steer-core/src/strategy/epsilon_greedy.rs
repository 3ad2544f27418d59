//! Epsilon-greedy selection with a geometrically annealed, per-type epsilon.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::argmax;
use crate::optimizer::{BanditCore, CoreConfig};

/// Classic epsilon-greedy over running-average normalized rewards.
///
/// Each query type carries its own exploration epsilon, initialized from the
/// configured value and annealed after every learning-mode decision whether or
/// not the exploration draw fired. The exploit path is a pure argmax over the
/// per-arm averages with ties broken by the lowest index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    initial_epsilon: f64,
    core: BanditCore,
}

impl EpsilonGreedy {
    pub fn new(config: CoreConfig, num_arms: usize, num_types: usize) -> Self {
        Self {
            initial_epsilon: config.exploration_epsilon,
            core: BanditCore::new(config, num_arms, num_types),
        }
    }

    pub fn select_arm<R: Rng + ?Sized>(&mut self, qtype: usize, exploit: bool, rng: &mut R) -> usize {
        if !exploit && self.core.explore_draw(qtype, rng) {
            return rng.gen_range(0..self.core.num_arms());
        }
        self.greedy_arm()
    }

    /// Arm with the highest average normalized reward. Deterministic for a
    /// fixed accumulated state.
    fn greedy_arm(&self) -> usize {
        let averages: Vec<f64> =
            (0..self.core.num_arms()).map(|a| self.core.arm_average(a)).collect();
        argmax(&averages)
    }

    pub fn update(&mut self, arm: usize, qtype: usize, raw_reward: f64) {
        self.core.record_sample(arm, qtype, raw_reward);
        if !self.core.should_update(arm, qtype) {
            return;
        }
        let normalized = self.core.normalize_reward(qtype, raw_reward);
        self.core.add_reward(arm, normalized);
    }

    pub fn name(&self) -> String {
        format!("EpsilonGreedy-{:.3}", self.initial_epsilon)
    }

    pub fn reset(&mut self, num_types: usize) {
        self.core.reset(num_types);
    }

    pub fn core(&self) -> &BanditCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut BanditCore {
        &mut self.core
    }
}
