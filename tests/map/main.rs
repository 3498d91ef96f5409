#![allow(clippy::cast_precision_loss)]

mod bounded;
mod min;
mod unbounded;

use active_subspaces::Subspace;
use nalgebra::DMatrix;

/// A basis split from the Q factor of a seeded Gaussian matrix.
fn random_subspace(m: usize, n: usize, seed: u64) -> Subspace {
    let mut rng = fastrand::Rng::with_seed(seed);
    let a = DMatrix::from_fn(m, m, |_, _| rng.f64() * 2.0 - 1.0);
    Subspace::from_eigenvectors(&a.qr().q(), n).unwrap()
}

/// `rows × m` points uniform on `[-1, 1]^m`.
fn uniform_points(rows: usize, m: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    DMatrix::from_fn(rows, m, |_, _| rng.f64() * 2.0 - 1.0)
}
