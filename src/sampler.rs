//! Box-constrained random walk over the inactive variables.
//!
//! For a fixed active point `y`, the inactive variables `z` must keep
//! `x = W1·y + W2·z` inside `[-1, 1]^m`. The feasible slice is a polytope in
//! ℝ^(m−n) and the target density on it is uniform, so a symmetric random
//! walk that accepts a proposal exactly when it stays feasible samples it
//! without any further Metropolis ratio.
//!
//! The chain runs `N` burn-in steps and then `N` recorded steps; every
//! recorded step stores the current state whether the proposal was
//! accepted or not. No convergence diagnostic is computed, so for large
//! inactive dimensions a short `N` may leave the chain close to its start.

use nalgebra::{DMatrix, DVector};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::rng_util;
use crate::solver::{LinearProgram, Simplex};
use crate::subspace::Subspace;

/// Fraction of the distance to the box faces used as the proposal scale.
const STEP_FRACTION: f64 = 0.1;

/// Random-walk sampler for inactive variables under the box constraint.
///
/// # Examples
///
/// ```
/// use active_subspaces::{ConstrainedSampler, Subspace};
/// use nalgebra::{DMatrix, DVector};
///
/// let s = core::f64::consts::FRAC_1_SQRT_2;
/// let w1 = DMatrix::from_row_slice(2, 1, &[s, s]);
/// let w2 = DMatrix::from_row_slice(2, 1, &[s, -s]);
/// let sub = Subspace::new(w1, w2).unwrap();
///
/// let sampler = ConstrainedSampler::with_seed(42);
/// let z = sampler.sample_z(&sub, &DVector::from_row_slice(&[0.5]), 100).unwrap();
/// assert_eq!(z.shape(), (1, 100));
/// ```
pub struct ConstrainedSampler {
    rng: Mutex<fastrand::Rng>,
    lp: Box<dyn LinearProgram>,
}

impl ConstrainedSampler {
    /// Creates a sampler with a random seed and the default LP solver.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a sampler with a fixed seed for reproducibility.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::builder().seed(seed).build()
    }

    /// Creates a builder for configuring a `ConstrainedSampler`.
    #[must_use]
    pub fn builder() -> ConstrainedSamplerBuilder {
        ConstrainedSamplerBuilder::new()
    }

    /// Draws `n_samples` correlated samples of `z` for the active point `y`.
    ///
    /// Returns an `(m − n) × n_samples` matrix, one sample per column, each
    /// satisfying `-1 ≤ W1·y + W2·z ≤ 1`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if `y` does not have `n` entries,
    /// and propagates the LP solver's error (typically `Error::Infeasible`)
    /// when `y` lies outside the zonotope and no starting point exists.
    pub fn sample_z(&self, subspace: &Subspace, y: &DVector<f64>, n_samples: usize) -> Result<DMatrix<f64>> {
        let (m, n) = (subspace.m(), subspace.n());
        if y.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                got: y.len(),
            });
        }
        let (w1, w2) = (subspace.w1(), subspace.w2());

        let s = w1 * y;
        let upper = s.map(|v| 1.0 - v);
        let lower = s.map(|v| -1.0 - v);

        let mut z0 = if s.iter().all(|v| v.abs() <= 1.0) {
            DVector::zeros(m - n)
        } else {
            trace_debug!("active contribution leaves the box; seeding chain from LP");
            let x0 = self.lp.linear_program_eq(
                &DVector::zeros(m),
                &w1.transpose(),
                y,
                &DVector::from_element(m, -1.0),
                &DVector::from_element(m, 1.0),
            )?;
            w2.transpose() * x0
        };

        let x0 = w2 * &z0 + &s;
        let sigma = STEP_FRACTION
            * x0.map(|v| v - 1.0)
                .norm()
                .max(x0.map(|v| v + 1.0).norm());

        let feasible = |z: &DVector<f64>| {
            let w = w2 * z;
            w.iter()
                .zip(upper.iter().zip(lower.iter()))
                .all(|(v, (u, l))| v <= u && v >= l)
        };

        let mut guard = self.rng.lock();
        let rng: &mut fastrand::Rng = &mut guard;
        let mut samples = DMatrix::zeros(m - n, n_samples);
        // Burn-in for the first n_samples steps, then record every state.
        for k in 0..2 * n_samples {
            let zc = &z0 + rng_util::normal_vector(rng, m - n) * sigma;
            if feasible(&zc) {
                z0 = zc;
            }
            if k >= n_samples {
                samples.set_column(k - n_samples, &z0);
            }
        }

        trace_debug!(n_samples, sigma, "constrained chain finished");
        Ok(samples)
    }
}

impl Default for ConstrainedSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a [`ConstrainedSampler`].
///
/// Defaults:
/// - `seed`: random
/// - `lp_solver`: [`Simplex`]
#[derive(Default)]
pub struct ConstrainedSamplerBuilder {
    seed: Option<u64>,
    lp: Option<Box<dyn LinearProgram>>,
}

impl ConstrainedSamplerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the LP backend used to find a feasible chain start.
    #[must_use]
    pub fn lp_solver(mut self, lp: impl LinearProgram + 'static) -> Self {
        self.lp = Some(Box::new(lp));
        self
    }

    /// Builds the configured [`ConstrainedSampler`].
    #[must_use]
    pub fn build(self) -> ConstrainedSampler {
        ConstrainedSampler {
            rng: Mutex::new(rng_util::make_rng(self.seed)),
            lp: self.lp.unwrap_or_else(|| Box::new(Simplex::new())),
        }
    }
}
