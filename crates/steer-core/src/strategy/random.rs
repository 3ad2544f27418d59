//! Uniform-random arm selection. The baseline every learning strategy is
//! measured against.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::optimizer::{BanditCore, CoreConfig};

/// Picks uniformly among the K arms and learns nothing.
///
/// Raw rewards are still recorded into the per-type distributions so that
/// `normalize_reward` reports comparable values across strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Random {
    core: BanditCore,
}

impl Random {
    pub fn new(config: CoreConfig, num_arms: usize, num_types: usize) -> Self {
        Self { core: BanditCore::new(config, num_arms, num_types) }
    }

    /// Uniform draw. In exploit mode there is no learned state to act on, so
    /// the arm is derived deterministically from the trial time instead of
    /// drawing, keeping exploit-mode selection a pure function of inputs.
    pub fn select_arm<R: Rng + ?Sized>(&self, time: usize, exploit: bool, rng: &mut R) -> usize {
        if exploit {
            time % self.core.num_arms()
        } else {
            rng.gen_range(0..self.core.num_arms())
        }
    }

    pub fn update(&mut self, arm: usize, qtype: usize, raw_reward: f64) {
        self.core.record_sample(arm, qtype, raw_reward);
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
