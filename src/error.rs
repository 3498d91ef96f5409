/// Errors returned by domain construction, solvers, and variable maps.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a basis split is malformed: wrong shapes, `n == 0`,
    /// `n >= m`, non-finite entries, or columns that are not orthonormal.
    #[error("invalid basis: {0}")]
    InvalidBasis(String),

    /// Returned when an input's dimension does not match the basis.
    #[error("dimension mismatch: expected {expected} but got {got}")]
    DimensionMismatch {
        /// The expected dimension.
        expected: usize,
        /// The dimension actually supplied.
        got: usize,
    },

    /// Returned when a point set has too little affine rank for a convex hull.
    #[error("degenerate hull: point set has affine rank {rank}, need {required}")]
    DegenerateHull {
        /// Affine rank of the supplied points.
        rank: usize,
        /// Rank required for a full-dimensional hull.
        required: usize,
    },

    /// Returned when a linear or quadratic program has no feasible point.
    #[error("program is infeasible")]
    Infeasible,

    /// Returned when a linear program's objective is unbounded below.
    #[error("program is unbounded")]
    Unbounded,

    /// Returned when a quadratic program's Hessian is not positive definite.
    #[error("quadratic program is not convex: Hessian is not positive definite")]
    NotConvex,

    /// Returned when a linear system cannot be solved.
    #[error("singular linear system")]
    SingularSystem,

    /// Returned when a solver exhausts its iteration budget.
    #[error("solver did not converge within {0} iterations")]
    IterationLimit(usize),

    /// Returned when an optimizer map is queried before `train`.
    #[error("variable map has not been trained")]
    NotTrained,

    /// Returned when a regression has fewer samples than coefficients.
    #[error("insufficient data: need at least {required} samples, got {got}")]
    InsufficientData {
        /// Number of samples required.
        required: usize,
        /// Number of samples supplied.
        got: usize,
    },

    /// Returned when inactive variables for one active point cannot be found.
    #[error("reconstruction failed for active point {index}: {source}")]
    Reconstruction {
        /// Row index of the active point in the input matrix.
        index: usize,
        /// The underlying solver failure.
        source: Box<Error>,
    },

    /// Returned when an argument is outside its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl Error {
    /// Wraps a solver failure with the index of the active point it belongs to.
    pub(crate) fn at_point(self, index: usize) -> Self {
        Error::Reconstruction {
            index,
            source: Box::new(self),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
