//! # Experiment Configuration
//!
//! An experiment file is a JSON array of [`ExperimentConfig`]s, each fully
//! describing one experiment: the training and testing workloads (per-arm
//! rewrites plus profiled latencies), a catalog statistics snapshot, trial
//! counts, the strategy roster, and one seed from which all randomness in the
//! experiment derives.
//!
//! ```json
//! [{
//!   "name": "two-join-baseline",
//!   "training": [{
//!     "arms": ["SELECT ... INNER MERGE JOIN ...", "SELECT ... INNER HASH JOIN ..."],
//!     "latencies": {"SELECT ... INNER MERGE JOIN ...": [42.0], "SELECT ... INNER HASH JOIN ...": [17.0]}
//!   }],
//!   "statistics": {"tables": {...}},
//!   "train_trials": 500,
//!   "test_trials": 100,
//!   "output_folder": "results/two-join",
//!   "seed": 17,
//!   "strategies": [{"type": "ucb"}, {"type": "lin_ucb", "dim": 8, "alpha": 1.0, "lambda": 0.1}]
//! }]
//! ```
//!
//! Each query type lists its arms explicitly, one executable rewrite per arm
//! (typically produced by `steer_sql::analyzer::enumerate_rewrites`, but arms
//! may also differ in join order). Every type must list the same number of
//! arms, in positionally analogous order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use steer_core::{CoreConfig, StrategyConfig};
use steer_sql::{InMemoryCatalog, SelectivityConfig};

use crate::error::HarnessError;

/// One query type: its executable rewrite arms plus profiled latencies, keyed
/// by exact rewrite text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadQuery {
    /// Rewrite text per arm, in stable arm-index order.
    pub arms: Vec<String>,
    /// Pre-recorded latency samples (milliseconds) per rewrite.
    pub latencies: HashMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    pub training: Vec<WorkloadQuery>,
    /// Held-out queries for the exploit-mode phase. Empty means the testing
    /// phase reuses the training workload. May list more types than training;
    /// the extra types are appended to the optimizer before testing starts.
    #[serde(default)]
    pub testing: Vec<WorkloadQuery>,
    /// Catalog statistics snapshot, fetched once before the experiment.
    pub statistics: InMemoryCatalog,
    pub train_trials: usize,
    #[serde(default)]
    pub test_trials: usize,
    /// Keep learning during the testing phase instead of freezing parameters.
    #[serde(default)]
    pub update_during_testing: bool,
    pub output_folder: PathBuf,
    pub seed: u64,
    #[serde(default)]
    pub core: CoreConfig,
    #[serde(default)]
    pub selectivity: SelectivityConfig,
    pub strategies: Vec<StrategyConfig>,
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.training.is_empty() {
            return Err(HarnessError::config("experiment has no training queries"));
        }
        if self.strategies.is_empty() {
            return Err(HarnessError::config("experiment has no strategies"));
        }
        if self.train_trials == 0 {
            return Err(HarnessError::config("train_trials must be positive"));
        }
        if self.training.iter().chain(&self.testing).any(|q| q.arms.is_empty()) {
            return Err(HarnessError::config("every query type must list at least one arm"));
        }
        if !self.testing.is_empty() && self.testing.len() < self.training.len() {
            // Type indices must mean the same shape in both phases; testing
            // may append unseen types but never drop trained ones.
            return Err(HarnessError::config(format!(
                "testing workload has {} query types but training has {}; \
                 testing may only add types",
                self.testing.len(),
                self.training.len()
            )));
        }
        Ok(())
    }
}

/// Load and validate every experiment in a configuration file.
pub fn load(path: &Path) -> Result<Vec<ExperimentConfig>, HarnessError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| HarnessError::ConfigIo { path: path.to_path_buf(), source })?;
    let configs: Vec<ExperimentConfig> = serde_json::from_str(&raw)?;
    for config in &configs {
        config.validate()?;
    }
    tracing::info!(path = %path.display(), experiments = configs.len(), "loaded configuration");
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config_json() -> String {
        r#"[{
            "name": "t",
            "training": [{"arms": ["SELECT * FROM a"], "latencies": {"SELECT * FROM a": [1.0]}}],
            "statistics": {"tables": {}},
            "train_trials": 10,
            "output_folder": "out",
            "seed": 1,
            "strategies": [{"type": "random"}]
        }]"#
        .to_string()
    }

    #[test]
    fn minimal_config_parses_with_defaults() {
        let configs: Vec<ExperimentConfig> =
            serde_json::from_str(&minimal_config_json()).unwrap();
        let config = &configs[0];
        assert!(config.validate().is_ok());
        assert_eq!(config.test_trials, 0);
        assert!(!config.update_during_testing);
        assert_eq!(config.core, CoreConfig::default());
        assert_eq!(config.selectivity, SelectivityConfig::default());
    }

    #[test]
    fn testing_may_add_types_but_never_drop_trained_ones() {
        let mut configs: Vec<ExperimentConfig> =
            serde_json::from_str(&minimal_config_json()).unwrap();
        // A testing workload with extra types is valid.
        configs[0].testing = vec![
            configs[0].training[0].clone(),
            configs[0].training[0].clone(),
        ];
        assert!(configs[0].validate().is_ok());

        // But fewer testing types than training types is not.
        let extra = configs[0].training[0].clone();
        configs[0].training.push(extra.clone());
        configs[0].training.push(extra);
        assert!(configs[0].validate().is_err());
    }

    #[test]
    fn armless_query_types_are_rejected() {
        let mut configs: Vec<ExperimentConfig> =
            serde_json::from_str(&minimal_config_json()).unwrap();
        configs[0].training[0].arms.clear();
        assert!(configs[0].validate().is_err());
    }

    #[test]
    fn unknown_strategy_in_config_fails_to_parse() {
        let json = minimal_config_json().replace("random", "softmax");
        assert!(serde_json::from_str::<Vec<ExperimentConfig>>(&json).is_err());
    }
}
