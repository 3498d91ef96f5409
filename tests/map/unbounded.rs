//! Integration tests for the Gaussian inverse map.

use active_subspaces::{ActiveVariableMap, UnboundedVariableMap};

use crate::{random_subspace, uniform_points};

#[test]
fn forward_then_inverse_recovers_active_part() {
    for (m, n, seed) in [(4, 1, 1), (6, 2, 2), (5, 4, 3)] {
        let map = UnboundedVariableMap::with_seed(random_subspace(m, n, seed), seed);
        let x = uniform_points(25, m, seed + 10);
        let (y, z) = map.forward(&x).unwrap();
        assert_eq!(y.shape(), (25, n));
        assert_eq!(z.shape(), (25, m - n));

        let rec = map.inverse(&y, 1).unwrap();
        assert_eq!(rec.x.shape(), (25, m));
        let (y_back, _) = map.forward(&rec.x).unwrap();
        assert!((y_back - &y).amax() < 1e-10, "m = {m}, n = {n}");
    }
}

#[test]
fn forward_is_a_rotation() {
    let map = UnboundedVariableMap::with_seed(random_subspace(5, 2, 4), 4);
    let x = uniform_points(10, 5, 5);
    let (y, z) = map.forward(&x).unwrap();
    let sub = map.subspace();
    let back = &y * sub.w1().transpose() + &z * sub.w2().transpose();
    assert!((back - x).amax() < 1e-12);
}

#[test]
fn inactive_draws_look_standard_normal() {
    let map = UnboundedVariableMap::with_seed(random_subspace(3, 1, 6), 6);
    let y = nalgebra::DMatrix::zeros(1, 1);
    let z = map.regularize_z(&y, 20_000).unwrap().remove(0);
    assert_eq!(z.shape(), (2, 20_000));
    let mean = z.mean();
    let var = z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / z.len() as f64;
    assert!(mean.abs() < 0.03, "mean = {mean}");
    assert!((var - 1.0).abs() < 0.05, "var = {var}");
}

#[test]
fn seeded_maps_repeat() {
    let y = nalgebra::DMatrix::from_row_slice(2, 2, &[0.1, 0.2, -0.3, 0.4]);
    let a = UnboundedVariableMap::with_seed(random_subspace(4, 2, 7), 9)
        .inverse(&y, 3)
        .unwrap();
    let b = UnboundedVariableMap::with_seed(random_subspace(4, 2, 7), 9)
        .inverse(&y, 3)
        .unwrap();
    assert_eq!(a.x, b.x);
}
