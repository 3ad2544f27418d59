//! # steer-core: Contextual Bandit Core for Join-Rewrite Selection
//!
//! This crate implements the learning core of the steer optimizer: a family of
//! multi-armed bandit strategies that learn, online, which physical join rewrite
//! to use for each recurring query shape, using observed execution latency as
//! the feedback signal.
//!
//! ## Module Overview
//!
//! - **`context`**: The per-arm feature vector type and the small linear-algebra
//!   helpers shared by the contextual strategies (stacking, column normalization,
//!   argmax, categorical sampling).
//! - **`reward`**: The online reward distribution that rescales each query type's
//!   raw latency-derived rewards onto a common bounded range.
//! - **`optimizer`**: Shared bandit bookkeeping -- arm/type counts, warm-up
//!   gating, annealed exploration epsilons, and growth/reset of per-type state.
//! - **`strategy`**: The pluggable selection/update algorithms (Random,
//!   EpsilonGreedy, UCB, LinUCB, Linear Thompson Sampling, EXP4), built on the
//!   shared core and resolved from a closed configuration enum.
//! - **`error`**: Construction and configuration errors.
//!
//! ## Design Notes
//!
//! All randomness is drawn from an explicitly threaded RNG: no strategy owns a
//! hidden random source. This is what makes exploit-mode selection a pure
//! function of accumulated state and makes a serialized optimizer reproduce
//! bit-for-bit identical decisions after deserialization, given the caller
//! replays the same RNG state and inputs.

pub mod context;
pub mod error;
pub mod optimizer;
pub mod reward;
pub mod strategy;

pub use context::ContextVector;
pub use optimizer::{BanditCore, CoreConfig};
pub use error::CoreError;
pub use reward::RewardDistribution;
pub use strategy::{Bandit, StrategyConfig};
