//! Forward and inverse maps between full and active coordinates.
//!
//! The forward map is the rotation `(y, z) = (W1ᵗx, W2ᵗx)`. The inverse map
//! is not unique: every `z` gives a full point `x = W1·y + W2·z`. An
//! [`ActiveVariableMap`] fixes that choice through its `regularize_z`
//! policy:
//!
//! | Map | Policy for `z` |
//! |-----|----------------|
//! | [`BoundedVariableMap`] | random walk over the slice of `[-1, 1]^m` consistent with `y` |
//! | [`UnboundedVariableMap`] | independent standard normal draws |
//! | [`MinVariableMap`] | minimizer of a trained quadratic model, replicated |

use nalgebra::{DMatrix, DVector};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::response_surface::{QuadraticModel, QuadraticRegression, ResponseSurface};
use crate::rng_util;
use crate::sampler::ConstrainedSampler;
use crate::solver::{ActiveSetQp, LinearProgram, QuadraticProgram};
use crate::subspace::Subspace;

/// Default ridge added to the inactive block of the trained Hessian.
pub const DEFAULT_RIDGE: f64 = 0.01;

/// Full points reconstructed from active points.
#[derive(Clone, Debug)]
pub struct Reconstruction {
    /// Full points, one per row, `(Ny·N) × m`. Rows `i·N .. (i+1)·N` belong
    /// to active point `i`.
    pub x: DMatrix<f64>,
    /// Source active-point index of every row of `x`.
    pub index: Vec<usize>,
}

/// A map between full inputs and active variables with a policy for the
/// inactive variables.
pub trait ActiveVariableMap {
    /// The basis split this map rotates by.
    fn subspace(&self) -> &Subspace;

    /// Inactive variables for each active point (row of `y`).
    ///
    /// Returns one `(m − n) × n_samples` matrix per row of `y`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Reconstruction` carrying the row index when no
    /// inactive assignment can be found for an active point.
    fn regularize_z(&self, y: &DMatrix<f64>, n_samples: usize) -> Result<Vec<DMatrix<f64>>>;

    /// Splits full points (rows of `x`) into active and inactive coordinates.
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if `x` does not have `m` columns.
    fn forward(&self, x: &DMatrix<f64>) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
        let sub = self.subspace();
        if x.ncols() != sub.m() {
            return Err(Error::DimensionMismatch {
                expected: sub.m(),
                got: x.ncols(),
            });
        }
        Ok((x * sub.w1(), x * sub.w2()))
    }

    /// Reconstructs `n_samples` full points per active point.
    ///
    /// Rows are grouped by active point with the samples innermost, so row
    /// `i·n_samples + k` holds sample `k` for active point `i`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `n_samples` is zero,
    /// `Error::DimensionMismatch` if `y` does not have `n` columns or the
    /// policy returns inactive samples of the wrong shape, and any error
    /// of [`regularize_z`](Self::regularize_z).
    fn inverse(&self, y: &DMatrix<f64>, n_samples: usize) -> Result<Reconstruction> {
        if n_samples == 0 {
            return Err(Error::InvalidArgument("inverse map needs at least one sample per point"));
        }
        let sub = self.subspace();
        let (m, n) = (sub.m(), sub.n());
        if y.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                got: y.ncols(),
            });
        }

        let z = self.regularize_z(y, n_samples)?;
        if z.len() != y.nrows() {
            return Err(Error::DimensionMismatch {
                expected: y.nrows(),
                got: z.len(),
            });
        }

        let mut x = DMatrix::zeros(y.nrows() * n_samples, m);
        for (i, zi) in z.iter().enumerate() {
            if zi.shape() != (m - n, n_samples) {
                return Err(Error::DimensionMismatch {
                    expected: m - n,
                    got: zi.nrows(),
                });
            }
            let s = sub.w1() * y.row(i).transpose();
            let mut block = sub.w2() * zi;
            for k in 0..n_samples {
                let mut col = block.column_mut(k);
                col += &s;
            }
            x.view_mut((i * n_samples, 0), (n_samples, m))
                .copy_from(&block.transpose());
        }

        let index = (0..y.nrows())
            .flat_map(|i| core::iter::repeat_n(i, n_samples))
            .collect();
        Ok(Reconstruction { x, index })
    }
}

fn check_active_dim(subspace: &Subspace, y: &DMatrix<f64>) -> Result<()> {
    if y.ncols() == subspace.n() {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected: subspace.n(),
            got: y.ncols(),
        })
    }
}

/// Map for inputs on `[-1, 1]^m`; inactive variables come from
/// [`ConstrainedSampler`] chains, one chain per active point.
///
/// # Examples
///
/// ```
/// use active_subspaces::map::{ActiveVariableMap, BoundedVariableMap};
/// use active_subspaces::Subspace;
/// use nalgebra::DMatrix;
///
/// let s = core::f64::consts::FRAC_1_SQRT_2;
/// let w1 = DMatrix::from_row_slice(2, 1, &[s, s]);
/// let w2 = DMatrix::from_row_slice(2, 1, &[s, -s]);
/// let map = BoundedVariableMap::with_seed(Subspace::new(w1, w2).unwrap(), 7);
///
/// let y = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
/// let rec = map.inverse(&y, 10).unwrap();
/// assert_eq!(rec.x.shape(), (20, 2));
/// assert!(rec.x.amax() <= 1.0 + 1e-9);
/// ```
pub struct BoundedVariableMap {
    subspace: Subspace,
    sampler: ConstrainedSampler,
}

impl BoundedVariableMap {
    /// Creates a map with a random seed and the default LP solver.
    #[must_use]
    pub fn new(subspace: Subspace) -> Self {
        Self::builder().build(subspace)
    }

    /// Creates a map with a fixed seed for reproducibility.
    #[must_use]
    pub fn with_seed(subspace: Subspace, seed: u64) -> Self {
        Self::builder().seed(seed).build(subspace)
    }

    /// Creates a builder for configuring a `BoundedVariableMap`.
    #[must_use]
    pub fn builder() -> BoundedVariableMapBuilder {
        BoundedVariableMapBuilder::default()
    }
}

impl ActiveVariableMap for BoundedVariableMap {
    fn subspace(&self) -> &Subspace {
        &self.subspace
    }

    fn regularize_z(&self, y: &DMatrix<f64>, n_samples: usize) -> Result<Vec<DMatrix<f64>>> {
        check_active_dim(&self.subspace, y)?;
        y.row_iter()
            .enumerate()
            .map(|(i, row)| {
                self.sampler
                    .sample_z(&self.subspace, &row.transpose(), n_samples)
                    .map_err(|e| e.at_point(i))
            })
            .collect()
    }
}

/// Builder for configuring a [`BoundedVariableMap`].
///
/// Defaults:
/// - `seed`: random
/// - `lp_solver`: [`Simplex`](crate::solver::Simplex)
#[derive(Default)]
pub struct BoundedVariableMapBuilder {
    sampler: crate::sampler::ConstrainedSamplerBuilder,
}

impl BoundedVariableMapBuilder {
    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.sampler = self.sampler.seed(seed);
        self
    }

    /// Sets the LP backend used to start chains outside the origin slice.
    #[must_use]
    pub fn lp_solver(mut self, lp: impl LinearProgram + 'static) -> Self {
        self.sampler = self.sampler.lp_solver(lp);
        self
    }

    /// Builds the map for `subspace`.
    #[must_use]
    pub fn build(self, subspace: Subspace) -> BoundedVariableMap {
        BoundedVariableMap {
            subspace,
            sampler: self.sampler.build(),
        }
    }
}

/// Map for standard normal inputs; inactive variables are independent
/// standard normal draws.
pub struct UnboundedVariableMap {
    subspace: Subspace,
    rng: Mutex<fastrand::Rng>,
}

impl UnboundedVariableMap {
    /// Creates a map with a random seed.
    #[must_use]
    pub fn new(subspace: Subspace) -> Self {
        Self {
            subspace,
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Creates a map with a fixed seed for reproducibility.
    #[must_use]
    pub fn with_seed(subspace: Subspace, seed: u64) -> Self {
        Self {
            subspace,
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl ActiveVariableMap for UnboundedVariableMap {
    fn subspace(&self) -> &Subspace {
        &self.subspace
    }

    fn regularize_z(&self, y: &DMatrix<f64>, n_samples: usize) -> Result<Vec<DMatrix<f64>>> {
        check_active_dim(&self.subspace, y)?;
        let k = self.subspace.m() - self.subspace.n();
        let mut rng = self.rng.lock();
        Ok((0..y.nrows())
            .map(|_| rng_util::normal_matrix(&mut rng, k, n_samples))
            .collect())
    }
}

/// Quantities of the trained local model in inactive coordinates.
struct TrainedModel {
    bz: DVector<f64>,
    zay: DMatrix<f64>,
    zaz: DMatrix<f64>,
    bounded: bool,
    surface: QuadraticModel,
}

/// Map that picks the inactive variables minimizing a quadratic model of
/// the function.
///
/// [`train`](Self::train) fits `f(x) ≈ c + bᵗx + ½xᵗAx` on the leading
/// `p` basis directions and stores the inactive blocks `bz = W2ᵗb`,
/// `zAy = W2ᵗAW1`, and `zAz = W2ᵗAW2 + ridge·I`. For an active point `y`
/// the model is minimized over `z` with linear term `c = bz + zAy·y`: in
/// closed form (`zAz·z = −c`) for unbounded inputs, or by a quadratic
/// program over the box `-1 ≤ W1·y + W2·z ≤ 1` for bounded ones.
///
/// # Examples
///
/// ```
/// use active_subspaces::map::{ActiveVariableMap, MinVariableMap};
/// use active_subspaces::Subspace;
/// use nalgebra::{DMatrix, DVector};
///
/// let sub = Subspace::from_eigenvectors(&DMatrix::identity(2, 2), 1).unwrap();
/// let mut map = MinVariableMap::new(sub);
///
/// let mut rng = fastrand::Rng::with_seed(1);
/// let x = DMatrix::from_fn(30, 2, |_, _| rng.f64() * 2.0 - 1.0);
/// let f = DVector::from_fn(30, |i, _| x.row(i).norm_squared());
/// map.train(&x, &f, false).unwrap();
///
/// let z = map.regularize_z(&DMatrix::from_row_slice(1, 1, &[0.4]), 3).unwrap();
/// assert!(z[0].amax() < 1e-8);
/// ```
pub struct MinVariableMap {
    subspace: Subspace,
    qp: Box<dyn QuadraticProgram>,
    surface: Box<dyn ResponseSurface>,
    ridge: f64,
    trained: Option<TrainedModel>,
}

impl MinVariableMap {
    /// Creates an untrained map with the default solver, regression, and ridge.
    #[must_use]
    pub fn new(subspace: Subspace) -> Self {
        Self::builder().build(subspace)
    }

    /// Creates a builder for configuring a `MinVariableMap`.
    #[must_use]
    pub fn builder() -> MinVariableMapBuilder {
        MinVariableMapBuilder::new()
    }

    /// Number of basis directions the local model is fitted on.
    #[must_use]
    pub fn model_dim(&self) -> usize {
        let (m, n) = (self.subspace.m(), self.subspace.n());
        if m - n > 2 { n + 2 } else { n + 1 }
    }

    /// Returns `true` once [`train`](Self::train) has succeeded.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    /// The fitted response surface in the leading basis directions.
    #[must_use]
    pub fn model(&self) -> Option<&QuadraticModel> {
        self.trained.as_ref().map(|t| &t.surface)
    }

    /// Fits the local quadratic model to samples `x` (one per row) with
    /// values `f`. `bounded` selects whether later reconstructions must keep
    /// `x` inside `[-1, 1]^m`.
    ///
    /// Retraining replaces the previous model.
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if `x` does not have `m` columns
    /// or `f` does not have one value per row, and propagates the
    /// regression's errors (`Error::InsufficientData` in particular).
    pub fn train(&mut self, x: &DMatrix<f64>, f: &DVector<f64>, bounded: bool) -> Result<()> {
        let m = self.subspace.m();
        if x.ncols() != m {
            return Err(Error::DimensionMismatch {
                expected: m,
                got: x.ncols(),
            });
        }
        if f.len() != x.nrows() {
            return Err(Error::DimensionMismatch {
                expected: x.nrows(),
                got: f.len(),
            });
        }

        let p = self.model_dim();
        let basis = self.subspace.basis();
        let wp = basis.columns(0, p);
        let surface = self.surface.fit(&(x * wp), f)?;

        let b = wp * &surface.gradient;
        let a = wp * &surface.hessian * wp.transpose();
        let (w1, w2) = (self.subspace.w1(), self.subspace.w2());
        let k = w2.ncols();

        let bz = w2.transpose() * b;
        let zay = w2.transpose() * &a * w1;
        let zaz = w2.transpose() * &a * w2 + DMatrix::identity(k, k) * self.ridge;

        trace_info!(
            p,
            samples = x.nrows(),
            r_squared = surface.r_squared,
            bounded,
            "trained inactive-variable model"
        );

        self.trained = Some(TrainedModel {
            bz,
            zay,
            zaz,
            bounded,
            surface,
        });
        Ok(())
    }

    fn minimize_z(&self, model: &TrainedModel, y: &DVector<f64>) -> Result<DVector<f64>> {
        let c = &model.bz + &model.zay * y;
        if !model.bounded {
            return model.zaz.clone().lu().solve(&(-c)).ok_or(Error::SingularSystem);
        }
        let (w1, w2) = (self.subspace.w1(), self.subspace.w2());
        let s = w1 * y;
        let a = DMatrix::from_fn(2 * w2.nrows(), w2.ncols(), |i, j| {
            if i < w2.nrows() {
                w2[(i, j)]
            } else {
                -w2[(i - w2.nrows(), j)]
            }
        });
        let b = DVector::from_fn(2 * s.len(), |i, _| {
            if i < s.len() { 1.0 - s[i] } else { 1.0 + s[i - s.len()] }
        });
        self.qp.quadratic_program_ineq(&c, &model.zaz, &a, &b)
    }
}

impl ActiveVariableMap for MinVariableMap {
    fn subspace(&self) -> &Subspace {
        &self.subspace
    }

    /// Returns the model minimizer for each active point, repeated
    /// `n_samples` times.
    fn regularize_z(&self, y: &DMatrix<f64>, n_samples: usize) -> Result<Vec<DMatrix<f64>>> {
        let model = self.trained.as_ref().ok_or(Error::NotTrained)?;
        check_active_dim(&self.subspace, y)?;
        y.row_iter()
            .enumerate()
            .map(|(i, row)| {
                let z = self
                    .minimize_z(model, &row.transpose())
                    .map_err(|e| e.at_point(i))?;
                Ok(DMatrix::from_fn(z.len(), n_samples, |r, _| z[r]))
            })
            .collect()
    }
}

/// Builder for configuring a [`MinVariableMap`].
///
/// Defaults:
/// - `qp_solver`: [`ActiveSetQp`]
/// - `response_surface`: [`QuadraticRegression`]
/// - `ridge`: 0.01
pub struct MinVariableMapBuilder {
    qp: Box<dyn QuadraticProgram>,
    surface: Box<dyn ResponseSurface>,
    ridge: f64,
}

impl MinVariableMapBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            qp: Box::new(ActiveSetQp::new()),
            surface: Box::new(QuadraticRegression::new()),
            ridge: DEFAULT_RIDGE,
        }
    }

    /// Sets the quadratic program backend for bounded reconstruction.
    #[must_use]
    pub fn qp_solver(mut self, qp: impl QuadraticProgram + 'static) -> Self {
        self.qp = Box::new(qp);
        self
    }

    /// Sets the regression used to fit the local quadratic model.
    #[must_use]
    pub fn response_surface(mut self, surface: impl ResponseSurface + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    /// Sets the ridge added to the inactive Hessian block.
    #[must_use]
    pub fn ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }

    /// Builds an untrained map for `subspace`.
    #[must_use]
    pub fn build(self, subspace: Subspace) -> MinVariableMap {
        MinVariableMap {
            subspace,
            qp: self.qp,
            surface: self.surface,
            ridge: self.ridge,
            trained: None,
        }
    }
}

impl Default for MinVariableMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_split(m: usize, n: usize) -> Subspace {
        Subspace::from_eigenvectors(&DMatrix::identity(m, m), n).unwrap()
    }

    fn uniform_inputs(rows: usize, m: usize, seed: u64) -> DMatrix<f64> {
        let mut rng = fastrand::Rng::with_seed(seed);
        rng_util::uniform_box(&mut rng, rows, m)
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let map = UnboundedVariableMap::with_seed(identity_split(3, 1), 1);
        assert!(matches!(
            map.forward(&DMatrix::zeros(2, 4)),
            Err(Error::DimensionMismatch { expected: 3, got: 4 })
        ));
    }

    #[test]
    fn test_inverse_row_order_and_index() {
        let map = UnboundedVariableMap::with_seed(identity_split(3, 1), 2);
        let y = DMatrix::from_row_slice(3, 1, &[-0.5, 0.0, 0.5]);
        let rec = map.inverse(&y, 4).unwrap();
        assert_eq!(rec.x.shape(), (12, 3));
        assert_eq!(rec.index, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
        for (row, &i) in rec.x.row_iter().zip(&rec.index) {
            assert!((row[0] - y[(i, 0)]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_inverse_rejects_zero_samples() {
        let map = UnboundedVariableMap::with_seed(identity_split(3, 1), 2);
        let y = DMatrix::zeros(1, 1);
        assert!(matches!(map.inverse(&y, 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_min_map_requires_training() {
        let map = MinVariableMap::new(identity_split(3, 1));
        assert!(!map.is_trained());
        let err = map.regularize_z(&DMatrix::zeros(1, 1), 1).unwrap_err();
        assert!(matches!(err, Error::NotTrained));
    }

    #[test]
    fn test_min_map_model_dimension() {
        assert_eq!(MinVariableMap::new(identity_split(3, 1)).model_dim(), 2);
        assert_eq!(MinVariableMap::new(identity_split(6, 2)).model_dim(), 4);
        assert_eq!(MinVariableMap::new(identity_split(4, 3)).model_dim(), 4);
    }

    #[test]
    fn test_min_map_unbounded_stationary_point() {
        // f = x0^2 + x0 x1 + 2 x1^2 + x1 depends only on the two fitted
        // directions, so the regression is exact.
        let mut map = MinVariableMap::new(identity_split(3, 1));
        let x = uniform_inputs(40, 3, 5);
        let f = DVector::from_fn(40, |i, _| {
            let (a, b) = (x[(i, 0)], x[(i, 1)]);
            a * a + a * b + 2.0 * b * b + b
        });
        map.train(&x, &f, false).unwrap();

        let y = DMatrix::from_row_slice(3, 1, &[-0.8, 0.1, 0.9]);
        let z = map.regularize_z(&y, 2).unwrap();
        for (i, zi) in z.iter().enumerate() {
            let expected = -(1.0 + y[(i, 0)]) / 4.01;
            assert_eq!(zi.shape(), (2, 2));
            assert!((zi[(0, 0)] - expected).abs() < 1e-8, "z0 = {}", zi[(0, 0)]);
            assert!(zi[(1, 0)].abs() < 1e-8);
            assert_eq!(zi.column(0), zi.column(1));
        }
    }

    #[test]
    fn test_min_map_bounded_clamps_to_box() {
        // Unconstrained z0 = -5/2.01 lies outside [-1, 1].
        let mut map = MinVariableMap::new(identity_split(3, 1));
        let x = uniform_inputs(40, 3, 6);
        let f = DVector::from_fn(40, |i, _| {
            let (a, b) = (x[(i, 0)], x[(i, 1)]);
            a * a + b * b + 5.0 * b
        });
        map.train(&x, &f, true).unwrap();

        let y = DMatrix::from_row_slice(1, 1, &[0.3]);
        let z = map.regularize_z(&y, 1).unwrap();
        assert!((z[0][(0, 0)] + 1.0).abs() < 1e-8, "z0 = {}", z[0][(0, 0)]);
        assert!(z[0][(1, 0)].abs() < 1e-8);
    }

    #[test]
    fn test_min_map_bounded_failure_names_point() {
        let mut map = MinVariableMap::new(identity_split(3, 1));
        let x = uniform_inputs(40, 3, 7);
        let f = DVector::from_fn(40, |i, _| x.row(i).norm_squared());
        map.train(&x, &f, true).unwrap();

        // y = 2 puts x0 outside the box for every z.
        let y = DMatrix::from_row_slice(2, 1, &[0.0, 2.0]);
        let err = map.regularize_z(&y, 1).unwrap_err();
        assert!(
            matches!(err, Error::Reconstruction { index: 1, .. }),
            "unexpected error: {err}"
        );
    }
}
