//! End-to-end experiment runs over a deterministic profiled workload.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use steer_core::{CoreConfig, StrategyConfig};
use steer_harness::{config, run_experiment, ExperimentConfig, WorkloadQuery};
use steer_sql::analyzer;

const TEMPLATE: &str = "SELECT * FROM players p INNER JOIN teams t ON p.team_id = t.id";

/// One join, two arms: the merge rewrite always takes 100ms, the hash rewrite
/// always takes 50ms.
fn two_arm_query() -> WorkloadQuery {
    let arms = analyzer::enumerate_rewrites(TEMPLATE).unwrap();
    assert_eq!(arms.len(), 2);
    let mut latencies = HashMap::new();
    latencies.insert(arms[0].clone(), vec![100.0]);
    latencies.insert(arms[1].clone(), vec![50.0]);
    WorkloadQuery { arms, latencies }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("steer-e2e-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn experiment(output_folder: PathBuf) -> ExperimentConfig {
    ExperimentConfig {
        name: "two-arm".to_string(),
        training: vec![two_arm_query()],
        testing: Vec::new(),
        statistics: steer_sql::InMemoryCatalog::new(),
        train_trials: 60,
        test_trials: 20,
        update_during_testing: false,
        output_folder,
        seed: 42,
        core: CoreConfig { warm_up: 1, ..CoreConfig::default() },
        selectivity: Default::default(),
        strategies: vec![StrategyConfig::EpsilonGreedy { epsilon: 0.1 }],
    }
}

#[test]
fn epsilon_greedy_converges_to_the_faster_rewrite() {
    let dir = scratch_dir("converge");
    run_experiment(&experiment(dir.clone())).unwrap();

    let raw = fs::read_to_string(dir.join("test_results.json")).unwrap();
    let results: HashMap<String, Vec<steer_harness::TrialRecord>> =
        serde_json::from_str(&raw).unwrap();
    let records = &results["EpsilonGreedy-0.100"];
    assert_eq!(records.len(), 20);

    // Exploit mode after 60 learning trials always picks the 50ms arm, and
    // the best-known arm carries zero regret.
    for record in records {
        assert_eq!(record.arm, 1);
        assert_eq!(record.elapsed_time, 50.0);
        assert_eq!(record.regret, 0.0);
        assert_eq!(record.best_arm, 1);
        assert_eq!(record.best_average, 50.0);
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn experiment_emits_all_artifacts() {
    let dir = scratch_dir("artifacts");
    run_experiment(&experiment(dir.clone())).unwrap();

    let raw = fs::read_to_string(dir.join("train_results.json")).unwrap();
    let results: HashMap<String, Vec<steer_harness::TrialRecord>> =
        serde_json::from_str(&raw).unwrap();
    // One record per learning trial; the warm-up trial leaves no record.
    assert_eq!(results["EpsilonGreedy-0.100"].len(), 60);

    // The trained bandit is persisted under its name key and loads back.
    let bandit = steer_harness::output::read_bandit(&dir.join("EpsilonGreedy-0.100.json")).unwrap();
    assert_eq!(bandit.name(), "EpsilonGreedy-0.100");
    assert_eq!(bandit.num_arms(), 2);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn identical_seeds_produce_identical_artifacts() {
    let dir_a = scratch_dir("seed-a");
    let dir_b = scratch_dir("seed-b");
    run_experiment(&experiment(dir_a.clone())).unwrap();
    run_experiment(&experiment(dir_b.clone())).unwrap();

    for file in ["train_results.json", "test_results.json", "EpsilonGreedy-0.100.json"] {
        let a = fs::read_to_string(dir_a.join(file)).unwrap();
        let b = fs::read_to_string(dir_b.join(file)).unwrap();
        assert_eq!(a, b, "{file} differs between identically seeded runs");
    }

    fs::remove_dir_all(&dir_a).unwrap();
    fs::remove_dir_all(&dir_b).unwrap();
}

#[test]
fn testing_workload_with_unseen_types_grows_the_optimizer() {
    let dir = scratch_dir("grow");
    let mut config = experiment(dir.clone());
    let second = {
        let template = "SELECT * FROM orders o INNER JOIN customers c ON o.customer_id = c.id";
        let arms = analyzer::enumerate_rewrites(template).unwrap();
        let mut latencies = HashMap::new();
        latencies.insert(arms[0].clone(), vec![80.0]);
        latencies.insert(arms[1].clone(), vec![40.0]);
        WorkloadQuery { arms, latencies }
    };
    config.testing = vec![two_arm_query(), second];
    run_experiment(&config).unwrap();

    // The optimizer grew to cover the held-out type before testing.
    let bandit = steer_harness::output::read_bandit(&dir.join("EpsilonGreedy-0.100.json")).unwrap();
    assert_eq!(bandit.num_types(), 2);

    let raw = fs::read_to_string(dir.join("test_results.json")).unwrap();
    let results: HashMap<String, Vec<steer_harness::TrialRecord>> =
        serde_json::from_str(&raw).unwrap();
    let records = &results["EpsilonGreedy-0.100"];
    assert!(records.iter().any(|r| r.query_type == 1));
    assert!(records.iter().all(|r| r.arm < 2));

    fs::remove_dir_all(&dir).unwrap();
}

/// Two arms with distinct join orders get distinct context vectors, so LinUCB
/// can separate them within one query type even though it has no random
/// exploration of its own.
#[test]
fn lin_ucb_learns_the_faster_join_order_within_a_type() {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use steer_core::ContextVector;
    use steer_harness::{run_phase, PhaseMode, ProfiledExecutor, Workload};
    use steer_sql::{ColumnStatistics, InMemoryCatalog, SelectivityConfig};

    let mut catalog = InMemoryCatalog::new();
    catalog.add_column("a", "x", ColumnStatistics::new(100_000.0, 1_000.0));
    catalog.add_column("a", "u", ColumnStatistics::new(100_000.0, 50.0));
    catalog.add_column("b", "y", ColumnStatistics::new(5_000.0, 5_000.0));
    catalog.add_column("b", "z", ColumnStatistics::new(5_000.0, 200.0));
    catalog.add_column("c", "w", ColumnStatistics::new(300.0, 300.0));
    catalog.add_column("c", "v", ColumnStatistics::new(300.0, 300.0));

    let arms = vec![
        "SELECT * FROM a INNER JOIN b ON a.x = b.y INNER JOIN c ON b.z = c.w".to_string(),
        "SELECT * FROM b INNER JOIN c ON b.z = c.w INNER JOIN a ON c.v = a.u".to_string(),
    ];
    let mut latencies = HashMap::new();
    latencies.insert(arms[0].clone(), vec![500.0]);
    latencies.insert(arms[1].clone(), vec![50.0]);
    let workload = Workload::build(
        &[WorkloadQuery { arms, latencies }],
        &catalog,
        &SelectivityConfig::default(),
    )
    .unwrap();
    assert_eq!(workload.context_dim, 8);

    let mut bandit = StrategyConfig::LinUcb { dim: 8, alpha: 1.0, lambda: 0.1 }
        .build(CoreConfig { warm_up: 1, ..CoreConfig::default() }, 2, 1)
        .unwrap();
    let mut executor = ProfiledExecutor::from_workload(&workload);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let sequence = vec![0; 201];
    let records = run_phase(
        &mut bandit,
        &workload,
        &catalog,
        &mut executor,
        &sequence,
        PhaseMode::training(),
        &mut rng,
    )
    .unwrap();

    // The two join orders produce distinct contexts, which is what the
    // shared ridge model separates the arms by.
    let qt = &workload.types[0];
    let contexts: Vec<ContextVector> = qt
        .arms
        .iter()
        .map(|arm| steer_sql::featurize::combine(&arm.shape, &catalog, &arm.selectivity))
        .collect();
    assert_ne!(contexts[0], contexts[1]);

    // The faster join order is discovered and dominates the learning phase,
    // overall and in the tail once the confidence radii have tightened.
    let arm_one_picks = records.iter().filter(|r| r.arm == 1).count();
    assert!(
        arm_one_picks > records.len() / 2,
        "arm 1 picked only {arm_one_picks} of {} trials",
        records.len()
    );
    let tail_arm_one = records[150..].iter().filter(|r| r.arm == 1).count();
    assert!(tail_arm_one > 30, "arm 1 picked only {tail_arm_one} of the last 50 trials");
    assert!(records.iter().any(|r| r.regret == 0.0));
}

#[test]
fn config_file_round_trip_drives_an_experiment() {
    let dir = scratch_dir("config");
    fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("experiments.json");
    let configs = vec![experiment(dir.join("out"))];
    fs::write(&config_path, serde_json::to_string_pretty(&configs).unwrap()).unwrap();

    let loaded = config::load(&config_path).unwrap();
    assert_eq!(loaded.len(), 1);
    run_experiment(&loaded[0]).unwrap();
    assert!(dir.join("out").join("train_results.json").exists());

    fs::remove_dir_all(&dir).unwrap();
}
