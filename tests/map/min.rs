//! Integration tests for the optimizer-based inverse map.

use active_subspaces::{ActiveVariableMap, Error, MinVariableMap};
use nalgebra::{DMatrix, DVector};

use crate::{random_subspace, uniform_points};

fn convex_quadratic() -> (DMatrix<f64>, DVector<f64>) {
    let m = DMatrix::from_row_slice(3, 3, &[3.0, 0.5, 0.2, 0.5, 2.0, -0.4, 0.2, -0.4, 1.5]);
    let q = DVector::from_row_slice(&[0.3, -0.1, 0.2]);
    (m, q)
}

fn evaluate(x: &DMatrix<f64>, m: &DMatrix<f64>, q: &DVector<f64>) -> DVector<f64> {
    DVector::from_fn(x.nrows(), |i, _| {
        let r = x.row(i).transpose();
        0.5 * r.dot(&(m * &r)) + q.dot(&r)
    })
}

#[test]
fn unbounded_matches_closed_form_stationary_point() {
    // With m - n = 1 the model spans the whole space, so the fit is exact.
    let sub = random_subspace(3, 2, 21);
    let (hess, lin) = convex_quadratic();
    let x = uniform_points(60, 3, 22);
    let f = evaluate(&x, &hess, &lin);

    let mut map = MinVariableMap::new(sub.clone());
    map.train(&x, &f, false).unwrap();
    assert!((map.model().unwrap().r_squared - 1.0).abs() < 1e-9);

    let (w1, w2) = (sub.w1(), sub.w2());
    let zaz = w2.transpose() * &hess * w2 + DMatrix::identity(1, 1) * 0.01;
    let y = DMatrix::from_row_slice(3, 2, &[0.1, -0.2, 0.5, 0.4, -0.7, 0.0]);
    let z = map.regularize_z(&y, 1).unwrap();
    for (i, zi) in z.iter().enumerate() {
        let yi = y.row(i).transpose();
        let c = w2.transpose() * &lin + w2.transpose() * &hess * w1 * &yi;
        let expected = zaz.clone().lu().solve(&(-c)).unwrap();
        assert!(
            (zi.column(0) - &expected).amax() < 1e-7,
            "point {i}: got {}, expected {}",
            zi[(0, 0)],
            expected[0]
        );
    }
}

#[test]
fn sum_of_squares_gives_zero_inactive_part() {
    let sub = random_subspace(2, 1, 31);
    let x = uniform_points(30, 2, 32);
    let f = DVector::from_fn(30, |i, _| x.row(i).norm_squared());
    let mut map = MinVariableMap::new(sub);
    map.train(&x, &f, false).unwrap();

    let y = DMatrix::from_row_slice(4, 1, &[-1.0, -0.3, 0.2, 0.9]);
    let rec = map.inverse(&y, 2).unwrap();
    assert_eq!(rec.x.shape(), (8, 2));
    for zi in map.regularize_z(&y, 1).unwrap() {
        assert!(zi.amax() < 1e-8);
    }
}

#[test]
fn bounded_agrees_with_unbounded_inside_box() {
    let sub = random_subspace(3, 2, 41);
    let hess = DMatrix::identity(3, 3) * 2.0;
    let lin = DVector::from_row_slice(&[0.1, -0.2, 0.05]);
    let x = uniform_points(60, 3, 42);
    let f = evaluate(&x, &hess, &lin);

    let mut free = MinVariableMap::new(sub.clone());
    free.train(&x, &f, false).unwrap();
    let mut boxed = MinVariableMap::new(sub);
    boxed.train(&x, &f, true).unwrap();

    let y = DMatrix::from_row_slice(2, 2, &[0.1, 0.1, -0.2, 0.05]);
    let a = free.regularize_z(&y, 1).unwrap();
    let b = boxed.regularize_z(&y, 1).unwrap();
    for (za, zb) in a.iter().zip(&b) {
        assert!((za - zb).amax() < 1e-8);
    }
}

#[test]
fn bounded_reconstruction_respects_box() {
    let sub = random_subspace(5, 1, 51);
    let x = uniform_points(80, 5, 52);
    // Strong pull toward x = 4 * W2[:, 0] pushes the optimum onto the box.
    let target = sub.w2().column(0) * 4.0;
    let f = DVector::from_fn(80, |i, _| (x.row(i).transpose() - &target).norm_squared());

    let mut map = MinVariableMap::new(sub);
    map.train(&x, &f, true).unwrap();
    let y = DMatrix::from_row_slice(3, 1, &[-0.2, 0.0, 0.3]);
    let rec = map.inverse(&y, 1).unwrap();
    assert!(rec.x.amax() <= 1.0 + 1e-8, "max |x| = {}", rec.x.amax());
}

#[test]
fn training_validates_shapes() {
    let mut map = MinVariableMap::new(random_subspace(4, 1, 61));
    let x = uniform_points(20, 3, 62);
    let f = DVector::zeros(20);
    assert!(matches!(
        map.train(&x, &f, false),
        Err(Error::DimensionMismatch { expected: 4, got: 3 })
    ));

    // p = 3 needs ten samples for a full quadratic.
    let x = uniform_points(6, 4, 63);
    let f = DVector::zeros(6);
    assert!(matches!(
        map.train(&x, &f, false),
        Err(Error::InsufficientData { required: 10, got: 6 })
    ));
    assert!(!map.is_trained());
}
