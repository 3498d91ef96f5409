//! Quadratic response surfaces.
//!
//! A degree-2 polynomial `f(y) ≈ c + gᵗy + ½yᵗHy` fitted by least squares.
//! [`MinVariableMap`](crate::map::MinVariableMap) reads the gradient `g` and
//! Hessian `H` off the fit to build its local model of the function.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Fitted quadratic model `f(y) ≈ constant + gradientᵗy + ½yᵗ·hessian·y`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadraticModel {
    /// Constant term.
    pub constant: f64,
    /// Linear coefficients (gradient at the origin).
    pub gradient: DVector<f64>,
    /// Symmetric Hessian.
    pub hessian: DMatrix<f64>,
    /// Coefficient of determination on the training data.
    pub r_squared: f64,
}

impl QuadraticModel {
    /// Evaluates the model at each row of `y`.
    #[must_use]
    pub fn predict(&self, y: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(y.nrows(), |i, _| {
            let row = y.row(i).transpose();
            self.constant + self.gradient.dot(&row) + 0.5 * row.dot(&(&self.hessian * &row))
        })
    }
}

/// Fits a response surface to samples.
pub trait ResponseSurface: Send + Sync {
    /// Fits the model to inputs `y` (one sample per row) and outputs `f`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if `y` and `f` disagree on the
    /// sample count, `Error::InsufficientData` if there are fewer samples
    /// than coefficients, and `Error::SingularSystem` if the least-squares
    /// solve fails.
    fn fit(&self, y: &DMatrix<f64>, f: &DVector<f64>) -> Result<QuadraticModel>;
}

/// Full degree-2 polynomial regression solved through an SVD.
///
/// # Examples
///
/// ```
/// use active_subspaces::response_surface::{QuadraticRegression, ResponseSurface};
/// use nalgebra::{DMatrix, DVector};
///
/// let y = DMatrix::from_fn(20, 1, |i, _| i as f64 / 10.0 - 1.0);
/// let f = y.map(|v| 1.0 + 2.0 * v + 1.5 * v * v).column(0).into_owned();
/// let model = QuadraticRegression::new().fit(&y, &f).unwrap();
/// assert!((model.gradient[0] - 2.0).abs() < 1e-9);
/// assert!((model.hessian[(0, 0)] - 3.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Default)]
pub struct QuadraticRegression;

impl QuadraticRegression {
    /// Creates the regression.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Number of coefficients of a full quadratic in `p` variables.
    #[must_use]
    pub fn n_coefficients(p: usize) -> usize {
        1 + p + p * (p + 1) / 2
    }
}

fn design_row(y: &[f64], out: &mut Vec<f64>) {
    out.clear();
    out.push(1.0);
    out.extend_from_slice(y);
    for i in 0..y.len() {
        for j in i..y.len() {
            out.push(y[i] * y[j]);
        }
    }
}

impl ResponseSurface for QuadraticRegression {
    fn fit(&self, y: &DMatrix<f64>, f: &DVector<f64>) -> Result<QuadraticModel> {
        let (samples, p) = y.shape();
        if f.len() != samples {
            return Err(Error::DimensionMismatch {
                expected: samples,
                got: f.len(),
            });
        }
        let n_coef = Self::n_coefficients(p);
        if samples < n_coef {
            return Err(Error::InsufficientData {
                required: n_coef,
                got: samples,
            });
        }

        let mut design = DMatrix::zeros(samples, n_coef);
        let mut row = Vec::with_capacity(n_coef);
        for i in 0..samples {
            let point: Vec<f64> = y.row(i).iter().copied().collect();
            design_row(&point, &mut row);
            for (j, v) in row.iter().enumerate() {
                design[(i, j)] = *v;
            }
        }

        let svd = design.clone().svd(true, true);
        let coef = svd
            .solve(f, 1e-12 * svd.singular_values.max().max(1.0))
            .map_err(|_| Error::SingularSystem)?;

        let gradient = DVector::from_fn(p, |i, _| coef[1 + i]);
        let mut hessian = DMatrix::zeros(p, p);
        let mut k = 1 + p;
        for i in 0..p {
            for j in i..p {
                if i == j {
                    hessian[(i, i)] = 2.0 * coef[k];
                } else {
                    hessian[(i, j)] = coef[k];
                    hessian[(j, i)] = coef[k];
                }
                k += 1;
            }
        }

        let fitted = &design * &coef;
        #[allow(clippy::cast_precision_loss)]
        let mean = f.sum() / samples as f64;
        let ss_res = (f - fitted).norm_squared();
        let ss_tot = f.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

        Ok(QuadraticModel {
            constant: coef[0],
            gradient,
            hessian,
            r_squared,
        })
    }
}
