//! Reproducible per-trial query-type sequences.
//!
//! The sequence is balanced by construction (types assigned round-robin, then
//! shuffled), so every type gets roughly equal exposure regardless of trial
//! count, and it is entirely determined by the caller's RNG state.

use rand::seq::SliceRandom;
use rand::Rng;

/// Build the type for each trial `0..=trials` (one extra leading entry for
/// the warm-up trial).
pub fn type_sequence<R: Rng + ?Sized>(num_types: usize, trials: usize, rng: &mut R) -> Vec<usize> {
    let mut sequence: Vec<usize> = (0..=trials).map(|i| i % num_types).collect();
    sequence.shuffle(rng);
    sequence
}
