//! LinUCB: ridge regression with confidence bounds over arm contexts.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::context::{argmax, normalize_columns, stack_contexts, ContextVector};
use crate::optimizer::{BanditCore, CoreConfig};

/// Contextual UCB with one shared ridge model across all arms and types.
///
/// State is a d×d design matrix `A` (initialized to `lambda * I`) and a d×1
/// response vector `b`. Selection computes `theta = A^-1 b` and scores each
/// arm's (column-normalized) context `x` as
///
/// ```text
/// score(x) = x . theta + alpha * sqrt(x . A^-1 . x)
/// ```
///
/// The inverse is recomputed on demand at every decision rather than updated
/// incrementally; context dimensionality is small (a few times the join
/// count), so the d^3 inversion is cheap next to a database round trip. The
/// ridge term keeps `A` invertible by construction, which is why a
/// non-positive lambda is rejected at configuration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinUcb {
    alpha: f64,
    lambda: f64,
    dim: usize,
    a: DMatrix<f64>,
    b: DVector<f64>,
    core: BanditCore,
}

impl LinUcb {
    pub fn new(
        config: CoreConfig,
        num_arms: usize,
        num_types: usize,
        dim: usize,
        alpha: f64,
        lambda: f64,
    ) -> Self {
        Self {
            alpha,
            lambda,
            dim,
            a: DMatrix::identity(dim, dim) * lambda,
            b: DVector::zeros(dim),
            core: BanditCore::new(config, num_arms, num_types),
        }
    }

    pub fn select_arm(&self, contexts: &[ContextVector]) -> usize {
        let mut stacked = stack_contexts(contexts);
        normalize_columns(&mut stacked);

        let a_inv = self
            .a
            .clone()
            .try_inverse()
            .expect("ridge term keeps the design matrix invertible");
        let theta = &a_inv * &self.b;

        let scores: Vec<f64> = (0..contexts.len())
            .map(|arm| {
                let x = stacked.row(arm).transpose();
                let exploitation = x.dot(&theta);
                // Numerical noise can push the quadratic form a hair below
                // zero for near-degenerate contexts.
                let quad = x.dot(&(&a_inv * &x)).max(0.0);
                exploitation + self.alpha * quad.sqrt()
            })
            .collect();
        argmax(&scores)
    }

    pub fn update(&mut self, arm: usize, qtype: usize, raw_reward: f64, contexts: &[ContextVector]) {
        self.core.record_sample(arm, qtype, raw_reward);
        if !self.core.should_update(arm, qtype) {
            return;
        }
        let normalized = self.core.normalize_reward(qtype, raw_reward);

        let mut stacked = stack_contexts(contexts);
        normalize_columns(&mut stacked);
        let x = stacked.row(arm).transpose();

        self.a += &x * x.transpose();
        self.b += x * normalized;
    }

    pub fn name(&self) -> String {
        format!("LinUCB-{:.3}-{:.3}", self.alpha, self.lambda)
    }

    pub fn reset(&mut self, num_types: usize) {
        self.a = DMatrix::identity(self.dim, self.dim) * self.lambda;
        self.b = DVector::zeros(self.dim);
        self.core.reset(num_types);
    }

    pub fn core(&self) -> &BanditCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut BanditCore {
        &mut self.core
    }
}
