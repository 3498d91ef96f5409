#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Active-variable domains and variable maps for active subspaces.
//!
//! Given a basis split `[W1 | W2]` of ℝ^m into `n` active and `m − n`
//! inactive directions, this crate describes where the active variables
//! `y = W1ᵗx` live, builds designs and quadrature rules there, and maps
//! active points back to full inputs by choosing the inactive variables
//! `z = W2ᵗx`.
//!
//! # Getting Started
//!
//! ```
//! use active_subspaces::prelude::*;
//! use nalgebra::DMatrix;
//!
//! let s = core::f64::consts::FRAC_1_SQRT_2;
//! let w1 = DMatrix::from_row_slice(2, 1, &[s, s]);
//! let w2 = DMatrix::from_row_slice(2, 1, &[s, -s]);
//! let sub = Subspace::new(w1, w2).unwrap();
//!
//! let domain = BoundedDomain::builder().seed(1).build(&sub).unwrap();
//! let y = domain.design(5).unwrap();
//!
//! let map = BoundedVariableMap::with_seed(sub, 1);
//! let rec = map.inverse(&y, 20).unwrap();
//! assert_eq!(rec.x.shape(), (100, 2));
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Subspace`] | Validated basis split `(W1, W2)`. |
//! | [`BoundedDomain`] | Zonotope `W1ᵗ[-1, 1]^m` (an interval when `n = 1`) with designs and quadrature rules. |
//! | [`UnboundedDomain`] | Standard normal active variables with Gauss–Hermite rules. |
//! | [`BoundedVariableMap`] | Inverse map sampling `z` by a box-constrained random walk. |
//! | [`UnboundedVariableMap`] | Inverse map drawing `z` from the standard normal. |
//! | [`MinVariableMap`] | Inverse map choosing `z` by minimizing a trained quadratic model. |
//!
//! Convex hulls, linear and quadratic programs, and the regression behind
//! [`MinVariableMap`] sit behind the traits [`HullProvider`](hull::HullProvider),
//! [`LinearProgram`](solver::LinearProgram),
//! [`QuadraticProgram`](solver::QuadraticProgram), and
//! [`ResponseSurface`](response_surface::ResponseSurface); the builders
//! accept any implementation.
//!
//! # Data Layout
//!
//! Matrices are [`nalgebra::DMatrix`] with one point per row: full inputs
//! are `N × m`, active points `N × n`. Inactive samples returned by
//! [`ActiveVariableMap::regularize_z`] are `(m − n) × N`, one sample per
//! column.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on vertex sets, half-spaces, quadrature rules, and fitted models | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) during construction, training, and solves | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod design;
pub mod domain;
mod error;
pub mod hull;
pub mod map;
pub mod quadrature;
pub mod response_surface;
mod rng_util;
mod sampler;
pub mod solver;
mod subspace;
pub mod zonotope;

pub use domain::{ActiveVariableDomain, BoundedDomain, BoundedDomainBuilder, UnboundedDomain};
pub use error::{Error, Result};
pub use map::{
    ActiveVariableMap, BoundedVariableMap, BoundedVariableMapBuilder, MinVariableMap,
    MinVariableMapBuilder, Reconstruction, UnboundedVariableMap,
};
pub use sampler::{ConstrainedSampler, ConstrainedSamplerBuilder};
pub use subspace::Subspace;

/// Convenient wildcard import for the most common types.
///
/// ```
/// use active_subspaces::prelude::*;
/// ```
pub mod prelude {
    pub use crate::domain::{ActiveVariableDomain, BoundedDomain, UnboundedDomain};
    pub use crate::error::{Error, Result};
    pub use crate::hull::{HalfSpaces, HullProvider, QuickHull};
    pub use crate::map::{
        ActiveVariableMap, BoundedVariableMap, MinVariableMap, Reconstruction,
        UnboundedVariableMap,
    };
    pub use crate::quadrature::QuadratureRule;
    pub use crate::response_surface::{QuadraticModel, QuadraticRegression, ResponseSurface};
    pub use crate::sampler::ConstrainedSampler;
    pub use crate::solver::{ActiveSetQp, LinearProgram, QuadraticProgram, Simplex};
    pub use crate::subspace::Subspace;
    pub use crate::zonotope::VertexSet;
}
