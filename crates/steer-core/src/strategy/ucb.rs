//! Upper-confidence-bound selection over running-average normalized rewards.

use serde::{Deserialize, Serialize};

use crate::context::argmax;
use crate::optimizer::{BanditCore, CoreConfig, COUNT_EPSILON};

/// UCB1-style selection:
///
/// ```text
/// score(a) = average(a) + sqrt(2 * time / (count(a) + 1e-7))
/// ```
///
/// The epsilon floor in the denominator gives arms with zero observations an
/// effectively unbounded bonus, so every arm is tried at least once before
/// exploitation can dominate. There is no separate random-exploration draw;
/// the confidence radius is the entire exploration mechanism, which also makes
/// selection deterministic for a fixed state and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ucb {
    core: BanditCore,
}

impl Ucb {
    pub fn new(config: CoreConfig, num_arms: usize, num_types: usize) -> Self {
        Self { core: BanditCore::new(config, num_arms, num_types) }
    }

    pub fn select_arm(&self, time: usize) -> usize {
        let scores: Vec<f64> = (0..self.core.num_arms())
            .map(|a| {
                let count = self.core.count(a) as f64 + COUNT_EPSILON;
                let radius = (2.0 * time as f64 / count).sqrt();
                self.core.arm_average(a) + radius
            })
            .collect();
        argmax(&scores)
    }

    pub fn update(&mut self, arm: usize, qtype: usize, raw_reward: f64) {
        self.core.record_sample(arm, qtype, raw_reward);
        if !self.core.should_update(arm, qtype) {
            return;
        }
        let normalized = self.core.normalize_reward(qtype, raw_reward);
        self.core.add_reward(arm, normalized);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_arms_win_over_observed_ones() {
        let config = CoreConfig { warm_up: 1, ..CoreConfig::default() };
        let mut s = Ucb::new(config, 3, 1);
        for _ in 0..20 {
            s.update(0, 0, -60.0);
            s.update(1, 0, -40.0);
        }
        // Arm 2 has no observations: its radius dwarfs any finite score.
        assert_eq!(s.select_arm(40), 2);
    }

    #[test]
    fn with_all_arms_seen_the_better_average_wins_eventually() {
        let config = CoreConfig { warm_up: 1, ..CoreConfig::default() };
        let mut s = Ucb::new(config, 2, 1);
        for _ in 0..200 {
            s.update(0, 0, -100.0);
            s.update(1, 0, -50.0);
        }
        // Equal counts cancel the radii; the average decides.
        assert_eq!(s.select_arm(400), 1);
    }
}
