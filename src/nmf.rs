//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
// This file implements NMF w/Multiplicative Updates by:
//
//     D. D. Lee, H. S. Seung. "Algorithms for Non-negative Matrix Factorization." NIPS 2001.
//
// minimizing || X - W H ||_F^2 subject to W >= 0, H >= 0
//
use ndarray::{Array2, Zip};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::error::{Result, TopicError};
use crate::sparse::SparseMatrix;

/// Added to every update denominator.
pub const EPSILON: f64 = 1e-10;

/// Relative error improvement below which iteration stops.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// The two factors of `X ≈ W H` plus the trace of the run that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorPair {
    /// document-topic weights, `[documents × rank]`
    pub w: Array2<f64>,
    /// topic-term weights, `[rank × terms]`
    pub h: Array2<f64>,
    /// `|| X - W H ||_F` after each iteration
    pub reconstruction_errors: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl FactorPair {
    pub fn rank(&self) -> usize {
        self.w.ncols()
    }

    /// Frobenius norm of the residual after the last iteration.
    pub fn reconstruction_error(&self) -> f64 {
        self.reconstruction_errors.last().copied().unwrap_or(f64::NAN)
    }
}

#[derive(Debug, Clone)]
pub struct NonNegativeFactorization {
    pub rank: usize,
    pub max_iterations: usize,
    pub seed: u64,
    pub tolerance: f64,
}

impl NonNegativeFactorization {
    pub fn new(rank: usize) -> Self {
        NonNegativeFactorization {
            rank,
            max_iterations: 100,
            seed: 1,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn validate(&self, matrix: &SparseMatrix) -> Result<()> {
        let (documents, terms) = matrix.shape();
        if self.rank == 0 || self.rank > documents.min(terms) {
            return Err(TopicError::InvalidRank {
                rank: self.rank,
                documents,
                terms,
            });
        }
        if self.max_iterations == 0 {
            return Err(TopicError::invalid("max_iterations", "must be at least 1"));
        }
        if !(self.tolerance >= 0.0) {
            return Err(TopicError::invalid(
                "tolerance",
                format!("{} is not a non-negative number", self.tolerance),
            ));
        }
        Ok(())
    }

    // uniform [0.1, 1) scaled so that W H starts near the magnitude of X
    fn initialize(&self, matrix: &SparseMatrix) -> (Array2<f64>, Array2<f64>) {
        let (d, v) = matrix.shape();
        let mean = matrix.mean();
        let scale = if mean > 0.0 {
            (mean / self.rank as f64).sqrt()
        } else {
            1.0
        };

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let dist = Uniform::new(0.1, 1.0);
        let w = Array2::random_using((d, self.rank), dist, &mut rng) * scale;
        let h = Array2::random_using((self.rank, v), dist, &mut rng) * scale;
        (w, h)
    }

    /// Factor `matrix` into non-negative `W` and `H`.
    ///
    /// The result depends only on the matrix and the fields of `self`.
    pub fn factor(&self, matrix: &SparseMatrix) -> Result<FactorPair> {
        self.validate(matrix)?;

        let (mut w, mut h) = self.initialize(matrix);
        let x_norm_sq = matrix.squared_frobenius_norm();
        let mut errors: Vec<f64> = Vec::with_capacity(self.max_iterations);
        let mut converged = false;

        for iteration in 1..=self.max_iterations {
            // H <- H * (W^t X) / (W^t W H + eps)
            let wt_x = matrix.transpose_dot(&w).reversed_axes();
            let wt_w_h = w.t().dot(&w).dot(&h);
            Zip::from(&mut h)
                .and(&wt_x)
                .and(&wt_w_h)
                .for_each(|h, &num, &den| *h = (*h * num / (den + EPSILON)).max(0.0));

            // W <- W * (X H^t) / (W H H^t + eps)
            let h_ht = h.dot(&h.t());
            let x_ht = matrix.dot(&h.t());
            let w_h_ht = w.dot(&h_ht);
            Zip::from(&mut w)
                .and(&x_ht)
                .and(&w_h_ht)
                .for_each(|w, &num, &den| *w = (*w * num / (den + EPSILON)).max(0.0));

            let error = residual_norm(x_norm_sq, &w, &x_ht, &h_ht);
            if !error.is_finite() {
                return Err(TopicError::NumericInstability { iteration });
            }
            errors.push(error);

            if iteration % 10 == 0 {
                debug!(iteration, error, "nmf progress");
            }

            let initial = errors[0];
            if initial == 0.0 {
                converged = true;
                break;
            }
            if iteration > 1 {
                let previous = errors[errors.len() - 2];
                if (previous - error) / initial < self.tolerance {
                    converged = true;
                    break;
                }
            }
        }

        let iterations = errors.len();
        info!(
            rank = self.rank,
            iterations,
            converged,
            error = errors[iterations - 1],
            "factorization finished"
        );

        Ok(FactorPair {
            w,
            h,
            reconstruction_errors: errors,
            iterations,
            converged,
        })
    }
}

/// Factor `matrix` with `rank` topics using the default tolerance.
pub fn factor(
    matrix: &SparseMatrix,
    rank: usize,
    max_iterations: usize,
    seed: u64,
) -> Result<FactorPair> {
    NonNegativeFactorization::new(rank)
        .max_iterations(max_iterations)
        .seed(seed)
        .factor(matrix)
}

// || X - W H ||_F from ||X||^2 - 2 <X H^t, W> + <W^t W, H H^t>,
// never materializing the dense product W H
fn residual_norm(x_norm_sq: f64, w: &Array2<f64>, x_ht: &Array2<f64>, h_ht: &Array2<f64>) -> f64 {
    let cross = (x_ht * w).sum();
    let quadratic = (&w.t().dot(w) * h_ht).sum();
    (x_norm_sq - 2.0 * cross + quadratic).max(0.0).sqrt()
}
