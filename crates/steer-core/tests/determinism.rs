//! Serialization round-trip determinism: a bandit serialized mid-training and
//! deserialized must reproduce the original instance's subsequent decisions
//! and state, given the same inputs and the same RNG stream.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use steer_core::{Bandit, ContextVector, CoreConfig, StrategyConfig};

fn contexts(dim: usize, arms: usize) -> Vec<ContextVector> {
    (0..arms)
        .map(|a| {
            ContextVector::new(
                (0..dim)
                    .map(|i| 100.0 / (a as f64 + 1.0) + i as f64)
                    .collect(),
            )
        })
        .collect()
}

fn drive(
    bandit: &mut Bandit,
    rng: &mut ChaCha8Rng,
    ctxs: &[ContextVector],
    start: usize,
    steps: usize,
) -> Vec<(usize, f64)> {
    let mut log = Vec::new();
    for time in start..start + steps {
        let qtype = time % bandit.num_types();
        let arm = bandit.select_arm(time, qtype, ctxs, false, rng);
        let raw = -50.0 - (arm as f64) * 25.0 - (time % 7) as f64;
        bandit.update(arm, qtype, raw, ctxs);
        log.push((arm, bandit.normalize_reward(qtype, raw)));
    }
    log
}

fn assert_round_trip_replays(config: StrategyConfig) {
    let core = CoreConfig { warm_up: 2, ..CoreConfig::default() };
    let ctxs = contexts(6, 3);

    let mut original = config.build(core, 3, 2).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    // Train for a while, then snapshot both the bandit and the RNG.
    drive(&mut original, &mut rng, &ctxs, 1, 40);
    let serialized = serde_json::to_string(&original).unwrap();
    let mut restored: Bandit = serde_json::from_str(&serialized).unwrap();
    let mut rng_restored = rng.clone();

    let expected = drive(&mut original, &mut rng, &ctxs, 41, 40);
    let replayed = drive(&mut restored, &mut rng_restored, &ctxs, 41, 40);

    assert_eq!(expected, replayed, "{} diverged after round trip", original.name());
    assert_eq!(
        serde_json::to_string(&original).unwrap(),
        serde_json::to_string(&restored).unwrap(),
        "{} state diverged after replay",
        original.name()
    );
}

#[test]
fn random_round_trips() {
    assert_round_trip_replays(StrategyConfig::Random);
}

#[test]
fn epsilon_greedy_round_trips() {
    assert_round_trip_replays(StrategyConfig::EpsilonGreedy { epsilon: 0.2 });
}

#[test]
fn ucb_round_trips() {
    assert_round_trip_replays(StrategyConfig::Ucb);
}

#[test]
fn linucb_round_trips() {
    assert_round_trip_replays(StrategyConfig::LinUcb { dim: 6, alpha: 1.0, lambda: 0.1 });
}

#[test]
fn linear_thompson_round_trips() {
    assert_round_trip_replays(StrategyConfig::LinearThompson {
        dim: 6,
        radius: 0.5,
        delta: 0.01,
    });
}

#[test]
fn exp4_round_trips() {
    assert_round_trip_replays(StrategyConfig::Exp4 { num_experts: 6, nu: 0.5, gamma: 0.01 });
}
