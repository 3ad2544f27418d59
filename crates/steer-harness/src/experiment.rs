//! # Experiment Orchestration
//!
//! Runs one configured experiment end to end: assemble the training (and
//! optional held-out testing) workloads, then for each configured strategy
//! run a training phase followed by an exploit-mode testing phase, persist
//! the trained bandit, and finally write the per-phase result artifacts.
//!
//! Every strategy starts from the same seed, so strategies are compared on
//! identical type sequences and latency draws.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::ExperimentConfig;
use crate::error::HarnessError;
use crate::executor::ProfiledExecutor;
use crate::output::{self, PhaseResults};
use crate::sequence::type_sequence;
use crate::trial::{run_phase, PhaseMode};
use crate::workload::Workload;

pub fn run_experiment(config: &ExperimentConfig) -> Result<(), HarnessError> {
    config.validate()?;
    let catalog = &config.statistics;

    let training = Workload::build(&config.training, catalog, &config.selectivity)?;
    let testing = if config.testing.is_empty() {
        None
    } else {
        let testing = Workload::build(&config.testing, catalog, &config.selectivity)?;
        if testing.num_arms != training.num_arms {
            return Err(HarnessError::config(format!(
                "testing workload has {} arms per type but training has {}",
                testing.num_arms, training.num_arms
            )));
        }
        Some(testing)
    };

    let mut train_results = PhaseResults::new();
    let mut test_results = PhaseResults::new();

    for strategy in &config.strategies {
        let mut bandit = strategy.build(config.core, training.num_arms, training.types.len())?;
        let name = bandit.name();
        tracing::info!(experiment = %config.name, strategy = %name, "training");

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut executor = ProfiledExecutor::from_workload(&training);
        let sequence = type_sequence(training.types.len(), config.train_trials, &mut rng);
        let records = run_phase(
            &mut bandit,
            &training,
            catalog,
            &mut executor,
            &sequence,
            PhaseMode::training(),
            &mut rng,
        )?;
        train_results.insert(name.clone(), records);

        if config.test_trials > 0 {
            tracing::info!(experiment = %config.name, strategy = %name, "testing");
            let workload = testing.as_ref().unwrap_or(&training);
            // A held-out workload may carry types never seen in training;
            // grow the optimizer so they get fresh per-type state.
            if workload.types.len() > bandit.num_types() {
                bandit.add_query_types(workload.types.len() - bandit.num_types());
            }
            let mut executor = ProfiledExecutor::from_workload(workload);
            let sequence = type_sequence(workload.types.len(), config.test_trials, &mut rng);
            let records = run_phase(
                &mut bandit,
                workload,
                catalog,
                &mut executor,
                &sequence,
                PhaseMode::testing(config.update_during_testing),
                &mut rng,
            )?;
            test_results.insert(name, records);
        }

        output::write_bandit(&config.output_folder, &bandit)?;
    }

    // Results only land once every strategy has finished both phases.
    output::write_results(&config.output_folder, "train_results.json", &train_results)?;
    if !test_results.is_empty() {
        output::write_results(&config.output_folder, "test_results.json", &test_results)?;
    }
    Ok(())
}
