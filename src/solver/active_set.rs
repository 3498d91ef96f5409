//! Primal active-set method for strictly convex quadratic programs.
//!
//! Minimizes `½xᵗQx + cᵗx` subject to `A·x ≤ b`. A feasible start comes
//! from a phase-one linear program solved with [`Simplex`]; each iteration
//! then solves the equality-constrained subproblem on the current working
//! set through its KKT system and either steps to the nearest blocking
//! constraint or drops the constraint with the most negative multiplier.

use nalgebra::{Cholesky, DMatrix, DVector};

use super::{QuadraticProgram, Simplex};
use crate::error::{Error, Result};

/// Default tolerance for step, multiplier, and feasibility tests.
const DEFAULT_TOL: f64 = 1e-10;
/// Default iteration budget.
const DEFAULT_MAX_ITER: usize = 1_000;

/// Active-set solver for convex quadratic programs with inequality constraints.
///
/// # Examples
///
/// ```
/// use active_subspaces::solver::{ActiveSetQp, QuadraticProgram};
/// use nalgebra::{DMatrix, DVector};
///
/// // min (x0 - 2)^2 + (x1 - 2)^2 subject to x0 + x1 <= 2.
/// let q = DMatrix::from_diagonal_element(2, 2, 2.0);
/// let c = DVector::from_row_slice(&[-4.0, -4.0]);
/// let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
/// let b = DVector::from_row_slice(&[2.0]);
/// let x = ActiveSetQp::new().quadratic_program_ineq(&c, &q, &a, &b).unwrap();
/// assert!((x[0] - 1.0).abs() < 1e-8 && (x[1] - 1.0).abs() < 1e-8);
/// ```
#[derive(Clone, Debug)]
pub struct ActiveSetQp {
    tolerance: f64,
    max_iterations: usize,
    phase_one: Simplex,
}

impl ActiveSetQp {
    /// Creates a solver with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOL,
            max_iterations: DEFAULT_MAX_ITER,
            phase_one: Simplex::new(),
        }
    }

    /// Sets the tolerance for step, multiplier, and feasibility tests.
    ///
    /// Default: 1e-10.
    #[must_use]
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Sets the maximum number of active-set iterations.
    ///
    /// Default: 1000.
    #[must_use]
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Finds a point with `A·x ≤ b` by a phase-one linear program over the
    /// split `x = p − q`, `p, q ≥ 0`, with slacks.
    fn feasible_point(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
        let (r, k) = a.shape();
        let std_a = DMatrix::from_fn(r, 2 * k + r, |i, j| {
            if j < k {
                a[(i, j)]
            } else if j < 2 * k {
                -a[(i, j - k)]
            } else if j - 2 * k == i {
                1.0
            } else {
                0.0
            }
        });
        let zero = DVector::zeros(2 * k + r);
        let v = self.phase_one.solve_standard_form(&zero, &std_a, b)?;
        Ok(v.rows(0, k) - v.rows(k, k))
    }

    /// Solves the KKT system of the equality subproblem on `working`.
    fn kkt_step(
        q: &DMatrix<f64>,
        a: &DMatrix<f64>,
        working: &[usize],
        gradient: &DVector<f64>,
    ) -> Result<(DVector<f64>, DVector<f64>)> {
        let k = q.nrows();
        let w = working.len();
        let kkt = DMatrix::from_fn(k + w, k + w, |i, j| match (i < k, j < k) {
            (true, true) => q[(i, j)],
            (true, false) => a[(working[j - k], i)],
            (false, true) => a[(working[i - k], j)],
            (false, false) => 0.0,
        });
        let rhs = DVector::from_fn(k + w, |i, _| if i < k { -gradient[i] } else { 0.0 });
        let sol = kkt.lu().solve(&rhs).ok_or(Error::SingularSystem)?;
        Ok((sol.rows(0, k).into_owned(), sol.rows(k, w).into_owned()))
    }
}

impl Default for ActiveSetQp {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadraticProgram for ActiveSetQp {
    fn quadratic_program_ineq(
        &self,
        c: &DVector<f64>,
        q: &DMatrix<f64>,
        a: &DMatrix<f64>,
        b: &DVector<f64>,
    ) -> Result<DVector<f64>> {
        let k = c.len();
        if q.shape() != (k, k) {
            return Err(Error::DimensionMismatch {
                expected: k,
                got: q.nrows(),
            });
        }
        if a.ncols() != k {
            return Err(Error::DimensionMismatch {
                expected: k,
                got: a.ncols(),
            });
        }
        if b.len() != a.nrows() {
            return Err(Error::DimensionMismatch {
                expected: a.nrows(),
                got: b.len(),
            });
        }

        let q = (q + q.transpose()) * 0.5;
        let chol = Cholesky::new(q.clone()).ok_or(Error::NotConvex)?;

        let slack = |x: &DVector<f64>| b - a * x;
        let scale = 1.0 + b.amax();

        // Unconstrained minimizer first; most calls never touch a bound.
        let unconstrained = -chol.solve(c);
        if slack(&unconstrained).min() >= -self.tolerance * scale {
            return Ok(unconstrained);
        }

        let mut x = self.feasible_point(a, b)?;
        let mut working: Vec<usize> = Vec::new();

        for iteration in 0..self.max_iterations {
            let gradient = &q * &x + c;
            let (p, lambda) = Self::kkt_step(&q, a, &working, &gradient)?;

            if p.amax() <= self.tolerance * (1.0 + x.amax()) {
                let most_negative = lambda
                    .iter()
                    .enumerate()
                    .min_by(|l, r| l.1.total_cmp(r.1))
                    .filter(|&(_, &l)| l < -self.tolerance * scale);
                match most_negative {
                    None => {
                        trace_debug!(iteration, active = working.len(), "active-set QP converged");
                        return Ok(x);
                    }
                    Some((idx, _)) => {
                        working.remove(idx);
                    }
                }
                continue;
            }

            let ap = a * &p;
            let current = slack(&x);
            let mut alpha = 1.0;
            let mut blocking = None;
            for i in (0..a.nrows()).filter(|i| !working.contains(i)) {
                if ap[i] > self.tolerance {
                    let step = (current[i] / ap[i]).max(0.0);
                    if step < alpha {
                        alpha = step;
                        blocking = Some(i);
                    }
                }
            }
            x += &p * alpha;
            if let Some(i) = blocking {
                working.push(i);
            }
        }
        Err(Error::IterationLimit(self.max_iterations))
    }
}
