//! Domains of the active variables.
//!
//! An [`ActiveVariableDomain`] hands out design points and quadrature rules
//! in the active coordinates `y = W1ᵗx`. Two variants exist:
//!
//! - [`UnboundedDomain`] for inputs with a standard normal density, where
//!   `y` is again standard normal and tensor Gauss–Hermite rules apply.
//! - [`BoundedDomain`] for inputs uniform on `[-1, 1]^m`, where `y` lives in
//!   the zonotope `W1ᵗ[-1, 1]^m`. Its geometry (vertices and, for more than
//!   one active variable, hull facets) is computed once at construction.

use nalgebra::DMatrix;
use parking_lot::Mutex;

use crate::design;
use crate::error::{Error, Result};
use crate::hull::{HalfSpaces, HullProvider, QuickHull};
use crate::quadrature::{self, QuadratureRule};
use crate::rng_util;
use crate::subspace::Subspace;
use crate::zonotope::{self, VertexSet};

/// Default number of random support directions for vertex sampling.
pub const DEFAULT_N_DIRECTIONS: usize = 10_000;
/// Default number of Monte Carlo samples behind quadrature weights.
pub const DEFAULT_N_MC_SAMPLES: usize = 10_000;
/// Default size of the maximin candidate pool.
pub const DEFAULT_N_CANDIDATES: usize = 2_000;

/// Design and integration queries on the active-variable domain.
pub trait ActiveVariableDomain: Send + Sync {
    /// Number of active variables.
    fn dim(&self) -> usize;

    /// Design points for evaluating a function of the active variables,
    /// one per row.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `n` is zero, and any error of
    /// the underlying design construction.
    fn design(&self, n: usize) -> Result<DMatrix<f64>>;

    /// Quadrature rule for integrating against the density of the active
    /// variables. Weights are non-negative and sum to one.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `n` is zero, and any error of
    /// the underlying rule construction.
    fn integration_rule(&self, n: usize) -> Result<QuadratureRule>;
}

/// Active domain for standard normal inputs.
///
/// Both queries use an `n`-per-dimension tensor Gauss–Hermite rule, so they
/// return `n^dim` points.
///
/// # Examples
///
/// ```
/// use active_subspaces::domain::{ActiveVariableDomain, UnboundedDomain};
/// use active_subspaces::Subspace;
/// use nalgebra::DMatrix;
///
/// let sub = Subspace::from_eigenvectors(&DMatrix::identity(4, 4), 2).unwrap();
/// let domain = UnboundedDomain::new(&sub);
/// let rule = domain.integration_rule(5).unwrap();
/// assert_eq!(rule.len(), 25);
/// assert!((rule.total_weight() - 1.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct UnboundedDomain {
    n: usize,
}

impl UnboundedDomain {
    /// Creates the domain for the active part of `subspace`.
    #[must_use]
    pub fn new(subspace: &Subspace) -> Self {
        Self { n: subspace.n() }
    }
}

impl ActiveVariableDomain for UnboundedDomain {
    fn dim(&self) -> usize {
        self.n
    }

    fn design(&self, n: usize) -> Result<DMatrix<f64>> {
        Ok(self.integration_rule(n)?.points)
    }

    fn integration_rule(&self, n: usize) -> Result<QuadratureRule> {
        quadrature::gauss_hermite(&vec![n; self.n])
    }
}

/// Active domain for inputs uniform on `[-1, 1]^m`.
///
/// For one active variable the domain is the interval `[yl, yu]` given by
/// [`zonotope::interval_endpoints`]. For more, vertices come from
/// [`zonotope::zonotope_vertices`] and the facets from the configured
/// [`HullProvider`].
pub struct BoundedDomain {
    w1: DMatrix<f64>,
    vertices: VertexSet,
    half_spaces: Option<HalfSpaces>,
    n_mc_samples: usize,
    n_candidates: usize,
    rng: Mutex<fastrand::Rng>,
}

impl BoundedDomain {
    /// Builds a domain with default settings.
    ///
    /// # Errors
    ///
    /// See [`BoundedDomainBuilder::build`].
    pub fn new(subspace: &Subspace) -> Result<Self> {
        Self::builder().build(subspace)
    }

    /// Creates a builder for configuring a `BoundedDomain`.
    #[must_use]
    pub fn builder() -> BoundedDomainBuilder {
        BoundedDomainBuilder::new()
    }

    /// Vertices of the domain paired with the hypercube corners that map to
    /// them. For one active variable these are the interval endpoints.
    #[must_use]
    pub fn vertices(&self) -> &VertexSet {
        &self.vertices
    }

    /// Hull facets, or `None` for a one-dimensional domain.
    #[must_use]
    pub fn half_spaces(&self) -> Option<&HalfSpaces> {
        self.half_spaces.as_ref()
    }

    /// Endpoints `(yl, yu)` for a one-dimensional domain.
    #[must_use]
    pub fn interval(&self) -> Option<(f64, f64)> {
        (self.w1.ncols() == 1).then(|| (self.vertices.y[(0, 0)], self.vertices.y[(1, 0)]))
    }
}

impl ActiveVariableDomain for BoundedDomain {
    fn dim(&self) -> usize {
        self.w1.ncols()
    }

    fn design(&self, n: usize) -> Result<DMatrix<f64>> {
        match (&self.half_spaces, self.interval()) {
            (None, Some((yl, yu))) => design::interval_design(yl, yu, n),
            (Some(hull), _) => {
                let seed = self.rng.lock().u32(..);
                design::maximin_design(&self.vertices.y, hull, n, self.n_candidates, seed)
            }
            (None, None) => Err(Error::InvalidArgument("bounded domain has no facets")),
        }
    }

    fn integration_rule(&self, n: usize) -> Result<QuadratureRule> {
        let mut rng = self.rng.lock();
        match (&self.half_spaces, self.interval()) {
            (None, Some((yl, yu))) => {
                design::interval_quadrature_rule(&self.w1, yl, yu, n, self.n_mc_samples, &mut rng)
            }
            (Some(hull), _) => design::zonotope_quadrature_rule(
                &self.w1,
                &self.vertices.y,
                hull,
                n,
                self.n_candidates,
                self.n_mc_samples,
                &mut rng,
            ),
            (None, None) => Err(Error::InvalidArgument("bounded domain has no facets")),
        }
    }
}

/// Builder for configuring a [`BoundedDomain`].
///
/// Defaults:
/// - `n_directions`: 10 000
/// - `n_mc_samples`: 10 000
/// - `n_candidates`: 2 000
/// - `seed`: random
/// - `hull`: [`QuickHull`]
pub struct BoundedDomainBuilder {
    n_directions: usize,
    n_mc_samples: usize,
    n_candidates: usize,
    seed: Option<u64>,
    hull: Box<dyn HullProvider>,
}

impl BoundedDomainBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_directions: DEFAULT_N_DIRECTIONS,
            n_mc_samples: DEFAULT_N_MC_SAMPLES,
            n_candidates: DEFAULT_N_CANDIDATES,
            seed: None,
            hull: Box::new(QuickHull::new()),
        }
    }

    /// Sets the number of random support directions used to find the
    /// zonotope vertices. More directions find more of them.
    #[must_use]
    pub fn n_directions(mut self, n: usize) -> Self {
        self.n_directions = n;
        self
    }

    /// Sets the number of Monte Carlo samples behind quadrature weights.
    #[must_use]
    pub fn n_mc_samples(mut self, n: usize) -> Self {
        self.n_mc_samples = n;
        self
    }

    /// Sets the size of the candidate pool for maximin designs.
    #[must_use]
    pub fn n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = n;
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the convex-hull backend.
    #[must_use]
    pub fn hull(mut self, hull: impl HullProvider + 'static) -> Self {
        self.hull = Box::new(hull);
        self
    }

    /// Computes the domain geometry for the active part of `subspace`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `n_directions` is zero for a
    /// domain with more than one active variable, and propagates the hull
    /// provider's error (`Error::DegenerateHull`) when the sampled vertices
    /// do not span the active space.
    pub fn build(self, subspace: &Subspace) -> Result<BoundedDomain> {
        let w1 = subspace.w1().clone();
        let mut rng = rng_util::make_rng(self.seed);

        let (vertices, half_spaces) = if subspace.n() == 1 {
            (zonotope::interval_endpoints(&w1), None)
        } else {
            if self.n_directions == 0 {
                return Err(Error::InvalidArgument("vertex sampling needs at least one direction"));
            }
            let vertices = zonotope::zonotope_vertices(&w1, self.n_directions, &mut rng);
            let hull = self.hull.half_spaces(&vertices.y)?;
            (vertices, Some(hull))
        };

        trace_info!(
            m = subspace.m(),
            n = subspace.n(),
            vertices = vertices.len(),
            facets = half_spaces.as_ref().map_or(0, HalfSpaces::len),
            "built bounded active domain"
        );

        Ok(BoundedDomain {
            w1,
            vertices,
            half_spaces,
            n_mc_samples: self.n_mc_samples,
            n_candidates: self.n_candidates,
            rng: Mutex::new(rng),
        })
    }
}

impl Default for BoundedDomainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
