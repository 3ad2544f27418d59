//! # steer-sql: Join Analysis and Featurization
//!
//! This crate turns SQL query templates and catalog statistics into the inputs
//! the bandit core consumes: rewrite arms and per-arm context vectors.
//!
//! ## Module Overview
//!
//! - **`catalog`**: Per-(table, column) statistics (row count, distinct count,
//!   optional value range and average string length) behind a `Catalog` trait,
//!   with an in-memory implementation that doubles as the per-experiment
//!   statistics snapshot.
//! - **`analyzer`**: Parses a query template, enumerates join-implementation
//!   rewrites, extracts the join graph in query order, and estimates
//!   per-table predicate selectivity.
//! - **`featurize`**: Combines catalog statistics and selectivity estimates
//!   into an order-invariant numeric context vector per arm.

pub mod analyzer;
pub mod catalog;
pub mod error;
pub mod featurize;

pub use analyzer::{JoinKeyword, QueryShape, SelectivityConfig, TableColumn};
pub use catalog::{Catalog, ColumnStatistics, InMemoryCatalog, ValueRange};
pub use error::AnalyzerError;
