//! Quadrature rules.
//!
//! [`gauss_hermite`] builds tensor-product Gauss–Hermite rules for the
//! standard normal density, used by the unbounded active domain. Nodes and
//! weights come from the Golub–Welsch eigenvalue method on the Jacobi matrix
//! of the probabilists' Hermite polynomials, so the weights of every rule sum
//! to one.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::error::{Error, Result};

/// Points (one per row) and non-negative weights of a quadrature rule.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadratureRule {
    /// Nodes, one per row.
    pub points: DMatrix<f64>,
    /// Weights, one per node.
    pub weights: DVector<f64>,
}

impl QuadratureRule {
    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    /// Returns `true` if the rule has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    /// Sum of the weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.weights.sum()
    }

    /// Applies the rule to `f`, evaluated once per node.
    pub fn integrate<F>(&self, mut f: F) -> f64
    where
        F: FnMut(&[f64]) -> f64,
    {
        self.points
            .row_iter()
            .zip(self.weights.iter())
            .map(|(row, w)| {
                let y: Vec<f64> = row.iter().copied().collect();
                w * f(&y)
            })
            .sum()
    }
}

/// One-dimensional `n`-point Gauss–Hermite nodes and weights, ascending.
fn gauss_hermite_1d(n: usize) -> (Vec<f64>, Vec<f64>) {
    if n == 1 {
        return (vec![0.0], vec![1.0]);
    }
    #[allow(clippy::cast_precision_loss)]
    let jacobi = DMatrix::from_fn(n, n, |i, j| {
        if i + 1 == j {
            (j as f64).sqrt()
        } else if j + 1 == i {
            (i as f64).sqrt()
        } else {
            0.0
        }
    });
    let eig = SymmetricEigen::new(jacobi);
    let mut pairs: Vec<(f64, f64)> = (0..n)
        .map(|k| (eig.eigenvalues[k], eig.eigenvectors[(0, k)].powi(2)))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.into_iter().unzip()
}

/// Tensor-product Gauss–Hermite rule for the standard normal density on ℝ^d,
/// with `orders[k]` nodes along dimension `k`.
///
/// Nodes are ordered lexicographically with the last dimension varying
/// fastest. Weights sum to one.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if `orders` is empty or contains a zero.
///
/// # Examples
///
/// ```
/// use active_subspaces::quadrature::gauss_hermite;
///
/// let rule = gauss_hermite(&[3, 3]).unwrap();
/// assert_eq!(rule.len(), 9);
/// // E[y0^2] = 1 under the standard normal.
/// let second = rule.integrate(|y| y[0] * y[0]);
/// assert!((second - 1.0).abs() < 1e-12);
/// ```
pub fn gauss_hermite(orders: &[usize]) -> Result<QuadratureRule> {
    if orders.is_empty() {
        return Err(Error::InvalidArgument("quadrature needs at least one dimension"));
    }
    if orders.contains(&0) {
        return Err(Error::InvalidArgument("quadrature order must be positive"));
    }

    let rules: Vec<(Vec<f64>, Vec<f64>)> = orders.iter().map(|&n| gauss_hermite_1d(n)).collect();
    let d = orders.len();
    let total: usize = orders.iter().product();

    let mut points = DMatrix::zeros(total, d);
    let mut weights = DVector::from_element(total, 1.0);
    for row in 0..total {
        let mut rem = row;
        for k in (0..d).rev() {
            let idx = rem % orders[k];
            rem /= orders[k];
            points[(row, k)] = rules[k].0[idx];
            weights[row] *= rules[k].1[idx];
        }
    }
    Ok(QuadratureRule { points, weights })
}
