//! # Statistics Featurizer
//!
//! Turns the analyzer's join structure plus catalog statistics into the
//! numeric context vector the contextual strategies consume. Each join edge
//! contributes four features: the selectivity-adjusted row counts of the two
//! joined relations and their selectivity-adjusted distinct counts, each pair
//! emitted as (max, min).
//!
//! The max/min canonicalization is load-bearing: a linear model trained on
//! `a JOIN b` sees the same features for `b JOIN a`, so learned coefficients
//! generalize across mirrored orderings of the same join.

use std::collections::HashMap;

use steer_core::ContextVector;

use crate::analyzer::QueryShape;
use crate::catalog::Catalog;

/// Context dimension for a query with `num_joins` equi-join edges.
pub fn context_dimension(num_joins: usize) -> usize {
    4 * num_joins
}

/// Rows surviving a keep-probability filter on the owning table.
pub fn apply_table_selectivity(row_count: f64, keep: f64) -> f64 {
    row_count * keep
}

/// Distinct values expected to survive when each of `row_count` rows is kept
/// independently with probability `keep`: each distinct value appears in
/// roughly `row_count / distinct_count` rows, and survives if any of them do.
pub fn apply_column_selectivity(distinct_count: f64, row_count: f64, keep: f64) -> f64 {
    if distinct_count <= 0.0 {
        return 0.0;
    }
    distinct_count * (1.0 - (1.0 - keep).powf(row_count / distinct_count))
}

/// Selectivity-adjusted (row count, distinct count) for one side of a join.
/// Missing catalog statistics fall back to neutral values rather than
/// erroring; a table absent from the selectivity map takes no discount.
fn adjusted_side(
    table: &str,
    column: &str,
    catalog: &dyn Catalog,
    selectivity: &HashMap<String, f64>,
) -> (f64, f64) {
    let Some(stats) = catalog.column(table, column) else {
        tracing::debug!(table, column, "no catalog statistics, using neutral features");
        return (1.0, 1.0);
    };
    let keep = selectivity.get(table).copied().unwrap_or(1.0);
    (
        apply_table_selectivity(stats.row_count, keep),
        apply_column_selectivity(stats.distinct_count, stats.row_count, keep),
    )
}

/// Build one arm's context vector from its join column order.
///
/// Layout per join edge: `[max(rows), min(rows), max(distinct), min(distinct)]`,
/// edges in join order, so the result has dimension `4 * num_joins`.
pub fn combine(
    shape: &QueryShape,
    catalog: &dyn Catalog,
    selectivity: &HashMap<String, f64>,
) -> ContextVector {
    let mut values = Vec::with_capacity(context_dimension(shape.num_joins()));
    for pair in shape.column_order.chunks_exact(2) {
        let (rows_a, distinct_a) = adjusted_side(&pair[0].table, &pair[0].column, catalog, selectivity);
        let (rows_b, distinct_b) = adjusted_side(&pair[1].table, &pair[1].column, catalog, selectivity);
        values.push(rows_a.max(rows_b));
        values.push(rows_a.min(rows_b));
        values.push(distinct_a.max(distinct_b));
        values.push(distinct_a.min(distinct_b));
    }
    ContextVector::new(values)
}
