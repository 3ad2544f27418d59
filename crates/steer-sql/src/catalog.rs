//! # Catalog Statistics
//!
//! The analyzer and featurizer need per-(table, column) facts: row count,
//! distinct-value count, and -- when the backing store knows them -- an integer
//! value range and an average string length. Statistics are fetched once per
//! experiment and treated as immutable for the duration of all trials; the
//! `Catalog` trait is the read-only interface the rest of the system sees.
//!
//! `InMemoryCatalog` is both the test/development implementation and the
//! serialized per-experiment snapshot format. In production the snapshot is
//! populated from the database's own statistics surface (e.g. CockroachDB's
//! `SHOW STATISTICS FOR TABLE`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Known integer value range of a column, inclusive of `min`, exclusive of
/// `max` for intersection-length purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: i64,
    pub max: i64,
}

impl ValueRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Length of the overlap with another range, floored at zero for
    /// disjoint ranges.
    pub fn intersection_len(&self, other: &ValueRange) -> i64 {
        (self.max.min(other.max) - self.min.max(other.min)).max(0)
    }
}

/// Catalog facts for one (table, column) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    /// Total rows in the owning table.
    pub row_count: f64,
    /// Number of distinct values in the column.
    pub distinct_count: f64,
    /// Known value range for integer columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_range: Option<ValueRange>,
    /// Average string length for text columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_string_length: Option<f64>,
}

impl ColumnStatistics {
    pub fn new(row_count: f64, distinct_count: f64) -> Self {
        Self {
            row_count,
            distinct_count,
            value_range: None,
            avg_string_length: None,
        }
    }

    pub fn with_value_range(mut self, min: i64, max: i64) -> Self {
        self.value_range = Some(ValueRange::new(min, max));
        self
    }

    pub fn with_avg_string_length(mut self, len: f64) -> Self {
        self.avg_string_length = Some(len);
        self
    }
}

/// Read-only statistics access, one lookup per table.
pub trait Catalog: Send + Sync {
    fn column_stats(&self, table: &str) -> Option<&HashMap<String, ColumnStatistics>>;

    /// Convenience lookup for a single column's statistics.
    fn column(&self, table: &str, column: &str) -> Option<&ColumnStatistics> {
        self.column_stats(table)?.get(column)
    }
}

/// In-memory catalog keyed by table name.
///
/// Serializable as the one per-experiment statistics snapshot that persists
/// across process runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    tables: HashMap<String, HashMap<String, ColumnStatistics>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        stats: ColumnStatistics,
    ) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(column.into(), stats);
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }
}

impl Catalog for InMemoryCatalog {
    fn column_stats(&self, table: &str) -> Option<&HashMap<String, ColumnStatistics>> {
        self.tables.get(table)
    }
}
