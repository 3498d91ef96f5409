//! Integration tests for the box-constrained inverse map.

use active_subspaces::{ActiveVariableMap, BoundedVariableMap, Error, Subspace};
use nalgebra::DMatrix;

use crate::{random_subspace, uniform_points};

#[test]
fn reconstructed_points_stay_in_box() {
    let map = BoundedVariableMap::with_seed(random_subspace(6, 2, 1), 11);
    // Active points of real inputs always have a feasible slice.
    let (y, _) = map.forward(&uniform_points(8, 6, 2)).unwrap();
    let rec = map.inverse(&y, 50).unwrap();
    assert_eq!(rec.x.shape(), (400, 6));
    assert!(rec.x.amax() <= 1.0 + 1e-9, "max |x| = {}", rec.x.amax());

    let (y_back, _) = map.forward(&rec.x).unwrap();
    for (k, &i) in rec.index.iter().enumerate() {
        for j in 0..2 {
            assert!((y_back[(k, j)] - y[(i, j)]).abs() < 1e-9);
        }
    }
}

#[test]
fn diagonal_plane_reconstruction() {
    let s = core::f64::consts::FRAC_1_SQRT_2;
    let sub = Subspace::new(
        DMatrix::from_row_slice(2, 1, &[s, s]),
        DMatrix::from_row_slice(2, 1, &[s, -s]),
    )
    .unwrap();
    let map = BoundedVariableMap::with_seed(sub, 3);

    // At y = sqrt(2) the slice collapses to the corner (1, 1).
    let y = DMatrix::from_row_slice(2, 1, &[0.0, core::f64::consts::SQRT_2]);
    let rec = map.inverse(&y, 20).unwrap();
    for k in 20..40 {
        assert!((rec.x[(k, 0)] - 1.0).abs() < 1e-9);
        assert!((rec.x[(k, 1)] - 1.0).abs() < 1e-9);
    }
    // At y = 0 the slice is the anti-diagonal x0 = -x1.
    for k in 0..20 {
        assert!((rec.x[(k, 0)] + rec.x[(k, 1)]).abs() < 1e-9);
    }
}

#[test]
fn point_outside_domain_reports_its_index() {
    let s = core::f64::consts::FRAC_1_SQRT_2;
    let sub = Subspace::new(
        DMatrix::from_row_slice(2, 1, &[s, s]),
        DMatrix::from_row_slice(2, 1, &[s, -s]),
    )
    .unwrap();
    let map = BoundedVariableMap::with_seed(sub, 5);
    let y = DMatrix::from_row_slice(3, 1, &[0.0, 0.5, 2.0]);
    let err = map.inverse(&y, 5).unwrap_err();
    match err {
        Error::Reconstruction { index, source } => {
            assert_eq!(index, 2);
            assert!(matches!(*source, Error::Infeasible));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn custom_lp_solver_is_used() {
    let sub = Subspace::new(
        DMatrix::from_row_slice(3, 1, &[0.8, 0.6, 0.0]),
        DMatrix::from_row_slice(3, 2, &[0.6, 0.0, -0.8, 0.0, 0.0, 1.0]),
    )
    .unwrap();
    // W1 * 1.3 leaves the box, so the chain needs an LP start.
    let y = DMatrix::from_row_slice(1, 1, &[1.3]);

    let default = BoundedVariableMap::with_seed(sub.clone(), 1);
    assert!(default.inverse(&y, 3).is_ok());

    // With no pivots allowed the injected solver cannot find that start.
    let starved = BoundedVariableMap::builder()
        .seed(1)
        .lp_solver(active_subspaces::solver::Simplex::new().max_iterations(0))
        .build(sub);
    assert!(matches!(
        starved.inverse(&y, 3),
        Err(Error::Reconstruction { index: 0, .. })
    ));
}
