//! Vertices of the zonotope `W1ᵗ[-1, 1]^m`.
//!
//! The image of the hypercube under `y = W1ᵗx` is a zonotope in ℝ^n. For
//! `n = 1` it is a closed interval whose endpoints come straight from the
//! signs of `W1`. For `n > 1` the vertices are found by support-function
//! sampling: for a direction `d`, the hypercube vertex `x = sign(W1·d)`
//! maximizes `dᵗW1ᵗx`, so `W1ᵗx` is a vertex of the zonotope. Sampling many
//! directions recovers the vertex set in expectation but never guarantees
//! it is complete; [`zonotope_vertex_count`] gives the exact count to check
//! against.

use std::collections::{HashMap, HashSet};

use nalgebra::DMatrix;

use crate::rng_util;

/// Paired zonotope vertices `y` (rows of `y`, k×n) and the hypercube
/// vertices `x` (rows of `x`, k×m) that map onto them.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexSet {
    /// Vertices in the active space, one per row.
    pub y: DMatrix<f64>,
    /// Hypercube corners in `{-1, 1}^m`, one per row, with `y = x · W1`.
    pub x: DMatrix<f64>,
}

impl VertexSet {
    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.y.nrows()
    }

    /// Returns `true` if the set holds no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.y.nrows() == 0
    }
}

/// Sign with `sign(0) = 1`, so every corner lies in `{-1, 1}^m`.
fn unit_sign(v: f64) -> f64 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

/// Endpoints of the interval `W1ᵗ[-1, 1]^m` for a single active direction.
///
/// Returns two vertices ordered so that `yl < yu`: row 0 holds `(yl, xl)`
/// and row 1 holds `(yu, xu)`, with `xu = sign(W1)` and `xl = -xu`. Zero
/// entries of `W1` take the sign `+1`; they do not move `y`.
///
/// Only the first column of `w1` is used.
#[must_use]
pub fn interval_endpoints(w1: &DMatrix<f64>) -> VertexSet {
    let m = w1.nrows();
    let col = w1.column(0);
    let sign: Vec<f64> = col.iter().map(|&v| unit_sign(v)).collect();
    let y0: f64 = col.iter().zip(&sign).map(|(w, s)| w * s).sum();

    // y0 = Σ|w_i| is non-negative, so the first branch only fires for
    // pathological input; ties fall through to (-y0, y0).
    let (yl, yu, orient) = if y0 < -y0 {
        (y0, -y0, 1.0)
    } else {
        (-y0, y0, -1.0)
    };

    let y = DMatrix::from_row_slice(2, 1, &[yl, yu]);
    let x = DMatrix::from_fn(2, m, |i, j| {
        let s = orient * sign[j];
        if i == 0 { s } else { -s }
    });
    VertexSet { y, x }
}

/// Approximate vertex set of the zonotope `W1ᵗ[-1, 1]^m` from
/// `n_directions` random support directions.
///
/// Each direction `d ~ N(0, I_n)` picks the corner `x = sign(W1·d)`.
/// Duplicate corners are dropped by exact comparison of their sign
/// patterns, keeping first-seen order.
pub fn zonotope_vertices(
    w1: &DMatrix<f64>,
    n_directions: usize,
    rng: &mut fastrand::Rng,
) -> VertexSet {
    let (m, n) = w1.shape();
    let directions = rng_util::normal_matrix(rng, n_directions, n);
    let scores = directions * w1.transpose();

    let mut seen: HashSet<Vec<bool>> = HashSet::new();
    let mut corners: Vec<Vec<f64>> = Vec::new();
    for row in scores.row_iter() {
        let pattern: Vec<bool> = row.iter().map(|&v| v < 0.0).collect();
        if seen.insert(pattern) {
            corners.push(row.iter().map(|&v| unit_sign(v)).collect());
        }
    }

    let x = DMatrix::from_fn(corners.len(), m, |i, j| corners[i][j]);
    let y = &x * w1;
    trace_debug!(
        n_directions,
        n_vertices = corners.len(),
        "sampled zonotope vertices"
    );
    VertexSet { y, x }
}

/// Memo table for the zonotope vertex-count recurrence.
///
/// The number of vertices of a zonotope with `m` generators in general
/// position in ℝ^n satisfies `N(m, n) = N(m−1, n−1) + N(m−1, n)` with
/// `N(1, n) = N(m, 1) = 2`. The cache is owned by the caller and can be
/// reused across queries.
#[derive(Debug, Default, Clone)]
pub struct VertexCountCache {
    table: HashMap<(usize, usize), u128>,
}

impl VertexCountCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices of a generic zonotope with `m` generators in ℝ^n.
    ///
    /// Returns 0 when either argument is 0. Saturates at `u128::MAX`.
    pub fn count(&mut self, m: usize, n: usize) -> u128 {
        if m == 0 || n == 0 {
            return 0;
        }
        if m == 1 || n == 1 {
            return 2;
        }
        if let Some(&k) = self.table.get(&(m, n)) {
            return k;
        }
        let k = self
            .count(m - 1, n - 1)
            .saturating_add(self.count(m - 1, n));
        self.table.insert((m, n), k);
        k
    }

    /// Number of memoized entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if nothing has been memoized yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Number of vertices of a generic zonotope with `m` generators in ℝ^n.
///
/// # Examples
///
/// ```
/// use active_subspaces::zonotope::zonotope_vertex_count;
///
/// // Three generators in the plane give a hexagon.
/// assert_eq!(zonotope_vertex_count(3, 2), 6);
/// ```
#[must_use]
pub fn zonotope_vertex_count(m: usize, n: usize) -> u128 {
    VertexCountCache::new().count(m, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orthonormal_columns(m: usize, n: usize, seed: u64) -> DMatrix<f64> {
        let mut rng = fastrand::Rng::with_seed(seed);
        let a = rng_util::normal_matrix(&mut rng, m, n);
        a.qr().q()
    }

    #[test]
    fn test_interval_endpoints_diagonal() {
        let s = core::f64::consts::FRAC_1_SQRT_2;
        let w1 = DMatrix::from_row_slice(2, 1, &[s, s]);
        let v = interval_endpoints(&w1);
        let sqrt2 = core::f64::consts::SQRT_2;
        assert!((v.y[(0, 0)] + sqrt2).abs() < 1e-12);
        assert!((v.y[(1, 0)] - sqrt2).abs() < 1e-12);
        assert_eq!(v.x.row(0).iter().copied().collect::<Vec<_>>(), vec![-1.0, -1.0]);
        assert_eq!(v.x.row(1).iter().copied().collect::<Vec<_>>(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_interval_endpoints_ordered_and_consistent() {
        for seed in 0..20 {
            let w1 = orthonormal_columns(6, 1, seed);
            let v = interval_endpoints(&w1);
            assert!(v.y[(0, 0)] < v.y[(1, 0)], "yl must be below yu");
            let proj = &v.x * &w1;
            assert!((proj - &v.y).amax() < 1e-12);
        }
    }

    #[test]
    fn test_interval_endpoints_zero_entry() {
        let w1 = DMatrix::from_row_slice(3, 1, &[0.6, 0.0, -0.8]);
        let v = interval_endpoints(&w1);
        assert!(v.x.iter().all(|&x| x == 1.0 || x == -1.0));
        assert!((v.y[(1, 0)] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_zonotope_vertices_are_unique_corners() {
        let w1 = orthonormal_columns(5, 2, 3);
        let mut rng = fastrand::Rng::with_seed(11);
        let v = zonotope_vertices(&w1, 2000, &mut rng);
        assert!(v.x.iter().all(|&x| x == 1.0 || x == -1.0));
        assert!((&v.x * &w1 - &v.y).amax() < 1e-12);
        for i in 0..v.len() {
            for j in (i + 1)..v.len() {
                assert_ne!(v.x.row(i), v.x.row(j), "rows {i} and {j} repeat");
            }
        }
    }

    #[test]
    fn test_zonotope_vertices_recovers_hexagon() {
        let a = 1.0 / 3.0_f64.sqrt();
        let b = core::f64::consts::FRAC_1_SQRT_2;
        let w1 = DMatrix::from_row_slice(3, 2, &[a, b, a, -b, a, 0.0]);
        let mut rng = fastrand::Rng::with_seed(2);
        let v = zonotope_vertices(&w1, 5000, &mut rng);
        assert_eq!(v.len() as u128, zonotope_vertex_count(3, 2));
    }

    #[test]
    fn test_vertex_count_matches_closed_form() {
        // 2 * sum_{k<n} C(m-1, k)
        fn closed(m: u128, n: u128) -> u128 {
            let mut total = 0;
            let mut binom = 1;
            for k in 0..n {
                total += binom;
                binom = binom * (m - 1 - k) / (k + 1);
            }
            2 * total
        }
        let mut cache = VertexCountCache::new();
        for m in 2..12 {
            for n in 1..m {
                assert_eq!(cache.count(m, n), closed(m as u128, n as u128), "m={m}, n={n}");
            }
        }
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_vertex_count_degenerate_arguments() {
        assert_eq!(zonotope_vertex_count(0, 2), 0);
        assert_eq!(zonotope_vertex_count(4, 1), 2);
        assert_eq!(zonotope_vertex_count(1, 3), 2);
    }
}
