//! Active/inactive basis split.
//!
//! A [`Subspace`] holds the two blocks of an orthonormal basis of ℝ^m:
//! `W1` (m×n, the active directions) and `W2` (m×(m−n), the inactive
//! directions). It is validated once on construction and never reshaped
//! afterward; every domain and variable map borrows or clones it.

use nalgebra::DMatrix;

use crate::error::{Error, Result};

/// Maximum deviation of `[W1 | W2]ᵗ[W1 | W2]` from the identity.
const ORTHONORMAL_TOL: f64 = 1e-8;

/// A validated basis split `(W1, W2)`.
///
/// # Examples
///
/// ```
/// use active_subspaces::Subspace;
/// use nalgebra::DMatrix;
///
/// let s = core::f64::consts::FRAC_1_SQRT_2;
/// let w1 = DMatrix::from_row_slice(2, 1, &[s, s]);
/// let w2 = DMatrix::from_row_slice(2, 1, &[s, -s]);
/// let sub = Subspace::new(w1, w2).unwrap();
/// assert_eq!((sub.m(), sub.n()), (2, 1));
/// ```
#[derive(Clone, Debug)]
pub struct Subspace {
    w1: DMatrix<f64>,
    w2: DMatrix<f64>,
}

impl Subspace {
    /// Creates a basis split from its active and inactive blocks.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBasis` if `w1` has no columns, the blocks do not
    /// share a row count, the column counts do not add up to `m`, `n >= m`,
    /// an entry is not finite, or `[W1 | W2]` is not orthonormal.
    pub fn new(w1: DMatrix<f64>, w2: DMatrix<f64>) -> Result<Self> {
        let (m, n) = w1.shape();
        if n == 0 {
            return Err(Error::InvalidBasis("W1 must have at least one column".into()));
        }
        if n >= m {
            return Err(Error::InvalidBasis(format!(
                "active dimension n = {n} must be smaller than m = {m}"
            )));
        }
        if w2.nrows() != m {
            return Err(Error::InvalidBasis(format!(
                "W2 has {} rows, W1 has {m}",
                w2.nrows()
            )));
        }
        if n + w2.ncols() != m {
            return Err(Error::InvalidBasis(format!(
                "W1 and W2 have {} columns in total, expected {m}",
                n + w2.ncols()
            )));
        }
        if w1.iter().chain(w2.iter()).any(|v| !v.is_finite()) {
            return Err(Error::InvalidBasis("basis contains non-finite entries".into()));
        }

        let w = stack_columns(&w1, &w2);
        let gram = w.transpose() * &w;
        let deviation = (gram - DMatrix::<f64>::identity(m, m)).amax();
        if deviation > ORTHONORMAL_TOL {
            return Err(Error::InvalidBasis(format!(
                "columns are not orthonormal (max deviation {deviation:e})"
            )));
        }

        Ok(Self { w1, w2 })
    }

    /// Splits a full m×m eigenvector matrix into its first `n` columns (W1)
    /// and the remaining `m − n` columns (W2).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBasis` if the matrix is not square or the
    /// resulting split fails the checks of [`Subspace::new`].
    pub fn from_eigenvectors(eigenvectors: &DMatrix<f64>, n: usize) -> Result<Self> {
        let (rows, cols) = eigenvectors.shape();
        if rows != cols {
            return Err(Error::InvalidBasis(format!(
                "eigenvector matrix must be square, got {rows}x{cols}"
            )));
        }
        if n == 0 || n >= cols {
            return Err(Error::InvalidBasis(format!(
                "active dimension n = {n} must lie in 1..{cols}"
            )));
        }
        let w1 = eigenvectors.columns(0, n).into_owned();
        let w2 = eigenvectors.columns(n, cols - n).into_owned();
        Self::new(w1, w2)
    }

    /// Full input dimension `m`.
    #[must_use]
    pub fn m(&self) -> usize {
        self.w1.nrows()
    }

    /// Active dimension `n`.
    #[must_use]
    pub fn n(&self) -> usize {
        self.w1.ncols()
    }

    /// Active directions, m×n.
    #[must_use]
    pub fn w1(&self) -> &DMatrix<f64> {
        &self.w1
    }

    /// Inactive directions, m×(m−n).
    #[must_use]
    pub fn w2(&self) -> &DMatrix<f64> {
        &self.w2
    }

    /// The full basis `[W1 | W2]`.
    #[must_use]
    pub fn basis(&self) -> DMatrix<f64> {
        stack_columns(&self.w1, &self.w2)
    }
}

fn stack_columns(a: &DMatrix<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
    let (m, na) = a.shape();
    let nb = b.ncols();
    DMatrix::from_fn(m, na + nb, |i, j| if j < na { a[(i, j)] } else { b[(i, j - na)] })
}
