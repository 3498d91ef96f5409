//! Dense two-phase simplex method with Bland's pivoting rule.

use nalgebra::{DMatrix, DVector};

use super::LinearProgram;
use crate::error::{Error, Result};

/// Default pivot tolerance.
const DEFAULT_TOL: f64 = 1e-10;
/// Default pivot budget per phase.
const DEFAULT_MAX_ITER: usize = 10_000;

/// Two-phase tableau simplex solver.
///
/// Small and dense; suitable for the feasibility programs that seed the
/// constrained sampler, where the number of variables is the full input
/// dimension.
///
/// # Examples
///
/// ```
/// use active_subspaces::solver::{LinearProgram, Simplex};
/// use nalgebra::{DMatrix, DVector};
///
/// // Find x in [-1, 1]^2 with x0 + x1 = 1.5.
/// let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
/// let b = DVector::from_row_slice(&[1.5]);
/// let lb = DVector::from_element(2, -1.0);
/// let ub = DVector::from_element(2, 1.0);
/// let x = Simplex::new()
///     .linear_program_eq(&DVector::zeros(2), &a, &b, &lb, &ub)
///     .unwrap();
/// assert!((x[0] + x[1] - 1.5).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct Simplex {
    tolerance: f64,
    max_iterations: usize,
}

impl Simplex {
    /// Creates a solver with default tolerance and pivot budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOL,
            max_iterations: DEFAULT_MAX_ITER,
        }
    }

    /// Sets the pivot tolerance.
    ///
    /// Default: 1e-10.
    #[must_use]
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Sets the maximum number of pivots per phase.
    ///
    /// Default: 10 000.
    #[must_use]
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Minimizes `cᵗx` subject to `A·x = b`, `x ≥ 0`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` for inconsistent shapes,
    /// `Error::Infeasible`, `Error::Unbounded`, or `Error::IterationLimit`.
    pub fn solve_standard_form(
        &self,
        c: &DVector<f64>,
        a: &DMatrix<f64>,
        b: &DVector<f64>,
    ) -> Result<DVector<f64>> {
        let (rows, cols) = a.shape();
        if c.len() != cols {
            return Err(Error::DimensionMismatch {
                expected: cols,
                got: c.len(),
            });
        }
        if b.len() != rows {
            return Err(Error::DimensionMismatch {
                expected: rows,
                got: b.len(),
            });
        }

        let rhs = cols + rows;
        let obj = rows;
        let mut t = DMatrix::zeros(rows + 1, rhs + 1);
        for i in 0..rows {
            let sign = if b[i] < 0.0 { -1.0 } else { 1.0 };
            for j in 0..cols {
                t[(i, j)] = sign * a[(i, j)];
            }
            t[(i, cols + i)] = 1.0;
            t[(i, rhs)] = sign * b[i];
        }
        let mut basis: Vec<usize> = (cols..cols + rows).collect();

        // Phase one: minimize the sum of artificials.
        for j in 0..cols {
            t[(obj, j)] = -(0..rows).map(|i| t[(i, j)]).sum::<f64>();
        }
        t[(obj, rhs)] = -(0..rows).map(|i| t[(i, rhs)]).sum::<f64>();
        let phase_one = self.iterate(&mut t, &mut basis, rhs)?;

        let infeasibility = -t[(obj, rhs)];
        #[allow(clippy::cast_precision_loss)]
        let limit = self.tolerance * (1.0 + b.amax()) * (rows.max(1) as f64) * 1e3;
        if infeasibility > limit {
            return Err(Error::Infeasible);
        }

        // Drive remaining artificials out of the basis where possible.
        for r in 0..rows {
            if basis[r] >= cols
                && let Some(q) = (0..cols).find(|&j| t[(r, j)].abs() > self.tolerance)
            {
                pivot(&mut t, r, q);
                basis[r] = q;
            }
        }

        // Phase two: restore the true objective in reduced-cost form.
        for j in 0..=rhs {
            t[(obj, j)] = if j < cols { c[j] } else { 0.0 };
        }
        for r in 0..rows {
            let cb = if basis[r] < cols { c[basis[r]] } else { 0.0 };
            for j in 0..=rhs {
                let v = t[(r, j)];
                t[(obj, j)] -= cb * v;
            }
        }
        let phase_two = self.iterate(&mut t, &mut basis, cols)?;
        trace_debug!(phase_one, phase_two, rows, cols, "simplex solved");

        let mut x = DVector::zeros(cols);
        for (r, &var) in basis.iter().enumerate() {
            if var < cols {
                x[var] = t[(r, rhs)].max(0.0);
            }
        }
        Ok(x)
    }

    /// Pivots until no column below `enter_limit` has a negative reduced cost.
    fn iterate(&self, t: &mut DMatrix<f64>, basis: &mut [usize], enter_limit: usize) -> Result<usize> {
        let rows = basis.len();
        let rhs = t.ncols() - 1;
        for iteration in 0..self.max_iterations {
            let Some(q) = (0..enter_limit).find(|&j| t[(rows, j)] < -self.tolerance) else {
                return Ok(iteration);
            };

            let mut leave: Option<(usize, f64)> = None;
            for r in 0..rows {
                let coef = t[(r, q)];
                if coef > self.tolerance {
                    let ratio = t[(r, rhs)] / coef;
                    let better = match leave {
                        None => true,
                        Some((lr, best)) => {
                            ratio < best - self.tolerance
                                || ((ratio - best).abs() <= self.tolerance && basis[r] < basis[lr])
                        }
                    };
                    if better {
                        leave = Some((r, ratio));
                    }
                }
            }
            let Some((r, _)) = leave else {
                return Err(Error::Unbounded);
            };
            pivot(t, r, q);
            basis[r] = q;
        }
        Err(Error::IterationLimit(self.max_iterations))
    }
}

impl Default for Simplex {
    fn default() -> Self {
        Self::new()
    }
}

fn pivot(t: &mut DMatrix<f64>, r: usize, q: usize) {
    let width = t.ncols();
    let p = t[(r, q)];
    for j in 0..width {
        t[(r, j)] /= p;
    }
    for i in 0..t.nrows() {
        if i == r {
            continue;
        }
        let factor = t[(i, q)];
        for j in 0..width {
            let v = t[(r, j)];
            t[(i, j)] -= factor * v;
        }
    }
}

impl LinearProgram for Simplex {
    fn linear_program_eq(
        &self,
        c: &DVector<f64>,
        a_eq: &DMatrix<f64>,
        b_eq: &DVector<f64>,
        lb: &DVector<f64>,
        ub: &DVector<f64>,
    ) -> Result<DVector<f64>> {
        let (k, m) = a_eq.shape();
        for len in [c.len(), lb.len(), ub.len()] {
            if len != m {
                return Err(Error::DimensionMismatch { expected: m, got: len });
            }
        }
        if b_eq.len() != k {
            return Err(Error::DimensionMismatch {
                expected: k,
                got: b_eq.len(),
            });
        }
        if lb.iter().zip(ub.iter()).any(|(l, u)| l > u || !l.is_finite() || !u.is_finite()) {
            return Err(Error::InvalidArgument("bounds must be finite with lb <= ub"));
        }

        // x = lb + u with 0 <= u <= ub - lb; slack w closes the upper bound.
        let a = DMatrix::from_fn(k + m, 2 * m, |i, j| {
            if i < k {
                if j < m { a_eq[(i, j)] } else { 0.0 }
            } else {
                let row = i - k;
                if j == row || j == m + row { 1.0 } else { 0.0 }
            }
        });
        let shift = a_eq * lb;
        let b = DVector::from_fn(k + m, |i, _| {
            if i < k { b_eq[i] - shift[i] } else { ub[i - k] - lb[i - k] }
        });
        let cost = DVector::from_fn(2 * m, |j, _| if j < m { c[j] } else { 0.0 });

        let u = self.solve_standard_form(&cost, &a, &b)?;
        Ok(lb + u.rows(0, m))
    }
}
