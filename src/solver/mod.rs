//! Linear and quadratic program solvers.
//!
//! The constrained sampler needs a feasible starting point from a linear
//! program, and the optimizer map solves a box-constrained quadratic
//! program per active point. Both are reached through the traits below so
//! callers can inject their own backend; [`Simplex`] and [`ActiveSetQp`] are
//! the in-crate defaults.

mod active_set;
mod simplex;

pub use active_set::ActiveSetQp;
pub use simplex::Simplex;

use nalgebra::{DMatrix, DVector};

use crate::error::Result;

/// A linear program backend with equality constraints and box bounds.
pub trait LinearProgram: Send + Sync {
    /// Minimizes `cᵗx` subject to `A_eq·x = b_eq` and `lb ≤ x ≤ ub`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Infeasible` if no `x` satisfies the constraints,
    /// `Error::Unbounded` if the objective has no lower bound, and
    /// `Error::DimensionMismatch` for inconsistent shapes.
    fn linear_program_eq(
        &self,
        c: &DVector<f64>,
        a_eq: &DMatrix<f64>,
        b_eq: &DVector<f64>,
        lb: &DVector<f64>,
        ub: &DVector<f64>,
    ) -> Result<DVector<f64>>;
}

/// A convex quadratic program backend with inequality constraints.
pub trait QuadraticProgram: Send + Sync {
    /// Minimizes `½xᵗQx + cᵗx` subject to `A·x ≤ b`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConvex` if `Q` is not positive definite,
    /// `Error::Infeasible` if the constraints admit no point, and
    /// `Error::DimensionMismatch` for inconsistent shapes.
    fn quadratic_program_ineq(
        &self,
        c: &DVector<f64>,
        q: &DMatrix<f64>,
        a: &DMatrix<f64>,
        b: &DVector<f64>,
    ) -> Result<DVector<f64>>;
}
