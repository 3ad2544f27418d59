//! # Workload Assembly
//!
//! Turns configured query types into fully analyzed [`QueryType`]s: each arm
//! analyzed individually for its own join order and per-table selectivity,
//! plus the profiled best/worst average latencies used for regret scaling.
//!
//! Everything here is setup-time. All arms of all types must exist, parse,
//! and have profiled latencies before the first trial runs; any gap aborts
//! the experiment instead of surfacing mid-run.

use std::collections::HashMap;

use steer_sql::analyzer;
use steer_sql::{Catalog, QueryShape, SelectivityConfig};

use crate::config::WorkloadQuery;
use crate::error::HarnessError;

/// One executable rewrite, analyzed on its own: arms of a type may differ in
/// join order, not just in forced join implementation, and each carries its
/// own join structure and selectivity map into featurization.
#[derive(Debug, Clone)]
pub struct Arm {
    pub sql: String,
    pub shape: QueryShape,
    /// Per-table keep fraction from this arm's WHERE clause.
    pub selectivity: HashMap<String, f64>,
}

/// One fully analyzed query type with its rewrite arms.
#[derive(Debug, Clone)]
pub struct QueryType {
    /// Arms in stable arm-index order.
    pub arms: Vec<Arm>,
    /// Profiled latency samples keyed by exact rewrite text.
    pub latencies: HashMap<String, Vec<f64>>,
    /// Arm with the lowest profiled average latency.
    pub best_arm: usize,
    pub best_average: f64,
    pub worst_average: f64,
}

#[derive(Debug, Clone)]
pub struct Workload {
    pub types: Vec<QueryType>,
    /// Arm count shared by every type.
    pub num_arms: usize,
    /// Context dimension shared by every arm of every type.
    pub context_dim: usize,
}

impl Workload {
    /// Analyze every arm of every type and validate the cross-type
    /// invariants: arm index i must denote the positionally analogous rewrite
    /// in every type, and every arm must have the same number of joins so all
    /// contexts share one dimension.
    pub fn build(
        queries: &[WorkloadQuery],
        catalog: &dyn Catalog,
        selectivity_config: &SelectivityConfig,
    ) -> Result<Self, HarnessError> {
        let mut types = Vec::with_capacity(queries.len());
        for query in queries {
            types.push(QueryType::build(query, catalog, selectivity_config)?);
        }

        let num_arms = types.first().map(|t| t.arms.len()).unwrap_or(0);
        let num_joins = types
            .first()
            .and_then(|t| t.arms.first())
            .map(|a| a.shape.num_joins())
            .unwrap_or(0);
        for qt in &types {
            if qt.arms.len() != num_arms {
                return Err(HarnessError::config(format!(
                    "all query types must share one arm count; found {} and {}",
                    qt.arms.len(),
                    num_arms
                )));
            }
            for arm in &qt.arms {
                if arm.shape.num_joins() != num_joins {
                    return Err(HarnessError::config(format!(
                        "all arms must share one join count; '{}' has {} joins \
                         but the first arm has {}",
                        arm.sql,
                        arm.shape.num_joins(),
                        num_joins
                    )));
                }
            }
        }

        tracing::info!(
            types = types.len(),
            num_arms,
            context_dim = steer_sql::featurize::context_dimension(num_joins),
            "assembled workload"
        );
        Ok(Self {
            types,
            num_arms,
            context_dim: steer_sql::featurize::context_dimension(num_joins),
        })
    }
}

impl QueryType {
    fn build(
        query: &WorkloadQuery,
        catalog: &dyn Catalog,
        selectivity_config: &SelectivityConfig,
    ) -> Result<Self, HarnessError> {
        let mut arms = Vec::with_capacity(query.arms.len());
        for sql in &query.arms {
            let shape = analyzer::analyze(sql)?;
            let selectivity = analyzer::where_selectivity(&shape, catalog, selectivity_config);
            arms.push(Arm { sql: sql.clone(), shape, selectivity });
        }

        // Regret needs a defined best/worst, and the simulated executor needs
        // samples for whichever arm the strategy picks, so every arm must
        // carry at least one profiled latency.
        let mut best_arm = 0;
        let mut best_average = f64::INFINITY;
        let mut worst_average = f64::NEG_INFINITY;
        for (i, arm) in arms.iter().enumerate() {
            let samples = query
                .latencies
                .get(&arm.sql)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    HarnessError::config(format!(
                        "no profiled latencies for rewrite: {}",
                        arm.sql
                    ))
                })?;
            let average = samples.iter().sum::<f64>() / samples.len() as f64;
            if average < best_average {
                best_average = average;
                best_arm = i;
            }
            worst_average = worst_average.max(average);
        }

        Ok(Self {
            arms,
            latencies: query.latencies.clone(),
            best_arm,
            best_average,
            worst_average,
        })
    }
}
