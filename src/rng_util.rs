use nalgebra::{DMatrix, DVector};

/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Draw from the standard normal distribution (Box-Muller transform).
pub(crate) fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    // 1 - u keeps u1 in (0, 1] so the log is finite.
    let u1 = 1.0 - rng.f64();
    let u2 = f64_range(rng, 0.0, core::f64::consts::TAU);
    (-2.0 * u1.ln()).sqrt() * u2.cos()
}

/// A vector of independent standard normal draws.
pub(crate) fn normal_vector(rng: &mut fastrand::Rng, len: usize) -> DVector<f64> {
    DVector::from_fn(len, |_, _| standard_normal(rng))
}

/// A matrix of independent standard normal draws.
pub(crate) fn normal_matrix(rng: &mut fastrand::Rng, rows: usize, cols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_, _| standard_normal(rng))
}

/// A `rows x cols` matrix with entries uniform on `[-1, 1)`.
pub(crate) fn uniform_box(rng: &mut fastrand::Rng, rows: usize, cols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_, _| f64_range(rng, -1.0, 1.0))
}

/// Build a generator from an optional seed.
pub(crate) fn make_rng(seed: Option<u64>) -> fastrand::Rng {
    seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_normal_moments() {
        let mut rng = fastrand::Rng::with_seed(7);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        #[allow(clippy::cast_precision_loss)]
        let mean = draws.iter().sum::<f64>() / n as f64;
        #[allow(clippy::cast_precision_loss)]
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean {mean} should be near 0");
        assert!((var - 1.0).abs() < 0.05, "variance {var} should be near 1");
    }

    #[test]
    fn test_uniform_box_bounds() {
        let mut rng = fastrand::Rng::with_seed(1);
        let m = uniform_box(&mut rng, 50, 4);
        assert!(m.iter().all(|v| (-1.0..1.0).contains(v)));
    }
}
