//! # Result Artifacts
//!
//! Per experiment, two kinds of output land in the configured folder:
//!
//! - `train_results.json` / `test_results.json`: per-strategy ordered trial
//!   records, written only once every strategy has completed its phases. A
//!   partially failed experiment emits nothing rather than a partial or
//!   zero-filled artifact.
//! - `<strategy-name>.json`: the serialized bandit, keyed by its `name()`.
//!   A deserialized bandit reproduces the original's subsequent behavior
//!   given the same inputs and RNG state, so these files support pausing and
//!   resuming training across process runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use steer_core::Bandit;

use crate::error::HarnessError;
use crate::trial::TrialRecord;

/// Ordered trial records per strategy name.
pub type PhaseResults = BTreeMap<String, Vec<TrialRecord>>;

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| HarnessError::OutputIo { path: path.to_path_buf(), source })?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
        .map_err(|source| HarnessError::OutputIo { path: path.to_path_buf(), source })?;
    Ok(())
}

/// Write one phase's results file.
pub fn write_results(
    folder: &Path,
    file_name: &str,
    results: &PhaseResults,
) -> Result<PathBuf, HarnessError> {
    let path = folder.join(file_name);
    write_json(&path, results)?;
    tracing::info!(path = %path.display(), strategies = results.len(), "wrote results");
    Ok(path)
}

/// Persist a bandit under its name-derived key.
pub fn write_bandit(folder: &Path, bandit: &Bandit) -> Result<PathBuf, HarnessError> {
    let path = folder.join(format!("{}.json", bandit.name()));
    write_json(&path, bandit)?;
    tracing::info!(path = %path.display(), "persisted bandit");
    Ok(path)
}

/// Load a previously persisted bandit.
pub fn read_bandit(path: &Path) -> Result<Bandit, HarnessError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| HarnessError::OutputIo { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_str(&raw)?)
}
