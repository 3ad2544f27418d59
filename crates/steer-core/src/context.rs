//! # Context Vectors and Shared Linear Algebra
//!
//! A context vector describes one arm's join-input statistics: for each join
//! edge in the arm's rewrite, the selectivity-adjusted row counts and distinct
//! counts of the two joined relations, canonically ordered (larger value first)
//! so that mirrored join orderings produce identical features.
//!
//! The contextual strategies consume contexts in two forms:
//!
//! - as individual vectors (dot products against a coefficient vector), and
//! - stacked into a K×D matrix (one row per arm) whose columns are normalized
//!   to unit sum, turning each feature dimension into a probability
//!   distribution over arms. EXP4 treats those columns as expert advice;
//!   LinUCB uses the same normalization as a scale guard so that features with
//!   wildly different magnitudes (row counts vs. distinct counts) do not
//!   dominate the ridge regression.

use nalgebra::{DMatrix, DVector};
use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fixed-dimension numeric feature vector for one arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextVector {
    values: DVector<f64>,
}

impl ContextVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values: DVector::from_vec(values) }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn as_vector(&self) -> &DVector<f64> {
        &self.values
    }

    /// Dot product against a coefficient vector of the same dimension.
    pub fn dot(&self, coefficients: &DVector<f64>) -> f64 {
        self.values.dot(coefficients)
    }
}

/// Stack per-arm contexts into a K×D matrix, one row per arm, preserving
/// arm-index order.
pub fn stack_contexts(contexts: &[ContextVector]) -> DMatrix<f64> {
    let rows = contexts.len();
    let cols = contexts.first().map(|c| c.dim()).unwrap_or(0);
    DMatrix::from_fn(rows, cols, |r, c| contexts[r].as_vector()[c])
}

/// Divide each column by its sum so the column becomes a probability
/// distribution over arms. Columns with (near-)zero mass are left untouched.
pub fn normalize_columns(matrix: &mut DMatrix<f64>) {
    for mut col in matrix.column_iter_mut() {
        let sum: f64 = col.iter().sum();
        if sum.abs() > f64::EPSILON {
            col /= sum;
        }
    }
}

/// Index of the first maximal value (ties broken by lowest index).
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if OrderedFloat(*v) > OrderedFloat(values[best]) {
            best = i;
        }
    }
    best
}

/// Draw an index from an (unnormalized) categorical distribution.
///
/// Falls back to a uniform draw when the distribution carries no positive
/// mass, so callers always get a valid arm index back.
pub fn sample_distribution<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }

    let mut remaining = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if w.is_finite() && *w > 0.0 {
            remaining -= w;
            if remaining <= 0.0 {
                return i;
            }
        }
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn stacking_preserves_arm_order() {
        let contexts = vec![
            ContextVector::new(vec![1.0, 2.0]),
            ContextVector::new(vec![3.0, 4.0]),
        ];
        let m = stack_contexts(&contexts);
        assert_eq!(m[(0, 1)], 2.0);
        assert_eq!(m[(1, 0)], 3.0);
    }

    #[test]
    fn column_normalization_produces_unit_sums() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 3.0, 0.0]);
        normalize_columns(&mut m);
        assert!((m.column(0).sum() - 1.0).abs() < 1e-12);
        // Zero-mass column left untouched.
        assert_eq!(m.column(1).sum(), 0.0);
    }

    #[test]
    fn argmax_breaks_ties_by_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.2]), 0);
        assert_eq!(argmax(&[-1.0, 0.0, 0.0]), 1);
    }

    #[test]
    fn sampling_degenerate_distribution_still_returns_valid_index() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        let idx = sample_distribution(&[0.0, 0.0, 0.0], &mut rng);
        assert!(idx < 3);
    }

    #[test]
    fn sampling_respects_mass() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(sample_distribution(&[0.0, 1.0, 0.0], &mut rng), 1);
        }
    }
}
