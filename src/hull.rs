//! Convex hulls as half-space systems.
//!
//! The bounded active domain needs the facets of the hull of the zonotope
//! vertices as constraints `A·y ≤ b`. [`HullProvider`] is the seam for that;
//! [`QuickHull`] is the default provider, an n-dimensional quickhull that
//! works on simplicial facets and merges coplanar facets in its output.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Half-space representation `{y : A·y ≤ b}` of a convex polytope.
///
/// Each row of `a` is a unit outward normal.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HalfSpaces {
    /// Outward unit normals, one facet per row (f×n).
    pub a: DMatrix<f64>,
    /// Offsets, one per facet.
    pub b: DVector<f64>,
}

impl HalfSpaces {
    /// Number of facets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.a.nrows()
    }

    /// Returns `true` if there are no facets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.a.nrows() == 0
    }

    /// Ambient dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.a.ncols()
    }

    /// Returns `true` if `y` satisfies every constraint up to `tol`.
    #[must_use]
    pub fn contains(&self, y: &[f64], tol: f64) -> bool {
        self.a
            .row_iter()
            .zip(self.b.iter())
            .all(|(row, &b)| row.iter().zip(y).map(|(a, v)| a * v).sum::<f64>() <= b + tol)
    }

    /// Largest constraint violation `max_i (a_i·y − b_i)`; negative inside.
    #[must_use]
    pub fn max_violation(&self, y: &[f64]) -> f64 {
        self.a
            .row_iter()
            .zip(self.b.iter())
            .map(|(row, &b)| row.iter().zip(y).map(|(a, v)| a * v).sum::<f64>() - b)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Computes the half-space representation of the convex hull of a point set.
pub trait HullProvider: Send + Sync {
    /// Returns the facets of the hull of `points` (one point per row).
    ///
    /// # Errors
    ///
    /// Returns `Error::DegenerateHull` if the points do not span an
    /// n-dimensional affine subspace.
    fn half_spaces(&self, points: &DMatrix<f64>) -> Result<HalfSpaces>;
}

/// Default hull provider: n-dimensional quickhull.
///
/// # Examples
///
/// ```
/// use active_subspaces::hull::{HullProvider, QuickHull};
/// use nalgebra::DMatrix;
///
/// let square = DMatrix::from_row_slice(4, 2, &[1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0]);
/// let h = QuickHull::new().half_spaces(&square).unwrap();
/// assert_eq!(h.len(), 4);
/// assert!(h.contains(&[0.5, -0.5], 1e-12));
/// assert!(!h.contains(&[1.5, 0.0], 1e-12));
/// ```
#[derive(Clone, Debug)]
pub struct QuickHull {
    tolerance: f64,
}

/// Default relative distance below which a point counts as on a facet.
const DEFAULT_HULL_TOL: f64 = 1e-9;

impl QuickHull {
    /// Creates a provider with the default tolerance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_HULL_TOL,
        }
    }

    /// Sets the relative tolerance for coplanarity and rank decisions.
    #[must_use]
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }
}

impl Default for QuickHull {
    fn default() -> Self {
        Self::new()
    }
}

struct Facet {
    vertices: Vec<usize>,
    normal: DVector<f64>,
    offset: f64,
    outside: Vec<usize>,
    alive: bool,
}

impl Facet {
    fn distance(&self, p: &DVector<f64>) -> f64 {
        self.normal.dot(p) - self.offset
    }
}

impl HullProvider for QuickHull {
    fn half_spaces(&self, points: &DMatrix<f64>) -> Result<HalfSpaces> {
        let (k, n) = points.shape();
        if n == 0 || k == 0 {
            return Err(Error::DegenerateHull {
                rank: 0,
                required: n.max(1),
            });
        }
        let pts: Vec<DVector<f64>> = points.row_iter().map(|r| r.transpose()).collect();
        let scale = points.amax().max(1.0);
        let eps = self.tolerance * scale;

        if n == 1 {
            return interval_half_spaces(&pts, eps);
        }

        let simplex = initial_simplex(&pts, eps)?;
        #[allow(clippy::cast_precision_loss)]
        let interior = simplex
            .iter()
            .fold(DVector::zeros(n), |acc, &i| acc + &pts[i])
            / (n + 1) as f64;

        let mut facets: Vec<Facet> = Vec::new();
        for skip in 0..=n {
            let vertices: Vec<usize> = simplex
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != skip)
                .map(|(_, &i)| i)
                .collect();
            facets.push(make_facet(vertices, &pts, &interior)?);
        }

        let rest: Vec<usize> = (0..k).filter(|i| !simplex.contains(i)).collect();
        assign_outside(&mut facets, 0, &rest, &pts, eps);

        while let Some(fi) = facets
            .iter()
            .position(|f| f.alive && !f.outside.is_empty())
        {
            let apex = furthest(&facets[fi], &pts);
            let visible: Vec<usize> = facets
                .iter()
                .enumerate()
                .filter(|(_, f)| f.alive && f.distance(&pts[apex]) > eps)
                .map(|(i, _)| i)
                .collect();

            let mut ridges: HashMap<Vec<usize>, usize> = HashMap::new();
            for &vi in &visible {
                let verts = &facets[vi].vertices;
                for skip in 0..verts.len() {
                    let mut ridge: Vec<usize> = verts
                        .iter()
                        .enumerate()
                        .filter(|&(j, _)| j != skip)
                        .map(|(_, &v)| v)
                        .collect();
                    ridge.sort_unstable();
                    *ridges.entry(ridge).or_insert(0) += 1;
                }
            }

            let mut orphans: Vec<usize> = Vec::new();
            for &vi in &visible {
                facets[vi].alive = false;
                orphans.extend(facets[vi].outside.drain(..).filter(|&p| p != apex));
            }

            let first_new = facets.len();
            let mut horizon: Vec<Vec<usize>> = ridges
                .into_iter()
                .filter(|&(_, c)| c == 1)
                .map(|(r, _)| r)
                .collect();
            horizon.sort_unstable();
            for mut ridge in horizon {
                ridge.push(apex);
                facets.push(make_facet(ridge, &pts, &interior)?);
            }
            assign_outside(&mut facets, first_new, &orphans, &pts, eps);
        }

        Ok(merge_facets(&facets, n, eps))
    }
}

fn interval_half_spaces(pts: &[DVector<f64>], eps: f64) -> Result<HalfSpaces> {
    let lo = pts.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
    let hi = pts.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
    if hi - lo <= eps {
        return Err(Error::DegenerateHull {
            rank: 0,
            required: 1,
        });
    }
    Ok(HalfSpaces {
        a: DMatrix::from_row_slice(2, 1, &[1.0, -1.0]),
        b: DVector::from_row_slice(&[hi, -lo]),
    })
}

/// Picks n+1 affinely independent points by repeated farthest-from-span search.
fn initial_simplex(pts: &[DVector<f64>], eps: f64) -> Result<Vec<usize>> {
    let n = pts[0].len();
    let first = (0..pts.len())
        .min_by(|&a, &b| pts[a][0].total_cmp(&pts[b][0]))
        .unwrap_or(0);
    let mut chosen = vec![first];
    let mut basis: Vec<DVector<f64>> = Vec::with_capacity(n);

    while chosen.len() <= n {
        let mut best: Option<(usize, f64, DVector<f64>)> = None;
        for (i, p) in pts.iter().enumerate() {
            let mut r = p - &pts[first];
            for q in &basis {
                let c = q.dot(&r);
                r -= q * c;
            }
            let d = r.norm();
            if best.as_ref().is_none_or(|(_, bd, _)| d > *bd) {
                best = Some((i, d, r));
            }
        }
        match best {
            Some((i, d, r)) if d > eps => {
                chosen.push(i);
                basis.push(r / d);
            }
            _ => {
                return Err(Error::DegenerateHull {
                    rank: basis.len(),
                    required: n,
                });
            }
        }
    }
    Ok(chosen)
}

/// Hyperplane through `vertices`, with its normal pointing away from `interior`.
fn make_facet(vertices: Vec<usize>, pts: &[DVector<f64>], interior: &DVector<f64>) -> Result<Facet> {
    let n = interior.len();
    let origin = &pts[vertices[0]];
    let edges = DMatrix::from_fn(n - 1, n, |i, j| pts[vertices[i + 1]][j] - origin[j]);

    // Generalized cross product: cofactor expansion along a virtual first row.
    let mut normal = DVector::from_fn(n, |j, _| {
        let minor = edges.clone().remove_column(j);
        let det = minor.determinant();
        if j % 2 == 0 { det } else { -det }
    });
    let norm = normal.norm();
    if norm <= f64::EPSILON {
        return Err(Error::DegenerateHull {
            rank: n - 1,
            required: n,
        });
    }
    normal /= norm;
    let mut offset = normal.dot(origin);
    if normal.dot(interior) > offset {
        normal = -normal;
        offset = -offset;
    }
    Ok(Facet {
        vertices,
        normal,
        offset,
        outside: Vec::new(),
        alive: true,
    })
}

fn assign_outside(facets: &mut [Facet], from: usize, candidates: &[usize], pts: &[DVector<f64>], eps: f64) {
    for &p in candidates {
        if let Some(f) = facets[from..]
            .iter_mut()
            .find(|f| f.alive && f.distance(&pts[p]) > eps)
        {
            f.outside.push(p);
        }
    }
}

fn furthest(facet: &Facet, pts: &[DVector<f64>]) -> usize {
    facet
        .outside
        .iter()
        .copied()
        .max_by(|&a, &b| facet.distance(&pts[a]).total_cmp(&facet.distance(&pts[b])))
        .unwrap_or(facet.outside[0])
}

/// Collects live facets, merging simplicial facets that share a hyperplane.
fn merge_facets(facets: &[Facet], n: usize, eps: f64) -> HalfSpaces {
    let mut rows: Vec<(DVector<f64>, f64)> = Vec::new();
    for f in facets.iter().filter(|f| f.alive) {
        let duplicate = rows
            .iter()
            .any(|(a, b)| (a - &f.normal).amax() <= eps.sqrt() && (b - f.offset).abs() <= eps.sqrt());
        if !duplicate {
            rows.push((f.normal.clone(), f.offset));
        }
    }
    HalfSpaces {
        a: DMatrix::from_fn(rows.len(), n, |i, j| rows[i].0[j]),
        b: DVector::from_fn(rows.len(), |i, _| rows[i].1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_corners(n: usize) -> DMatrix<f64> {
        let k = 1usize << n;
        DMatrix::from_fn(k, n, |i, j| if (i >> j) & 1 == 1 { 1.0 } else { -1.0 })
    }

    #[test]
    fn test_square_has_four_facets() {
        let h = QuickHull::new().half_spaces(&cube_corners(2)).unwrap();
        assert_eq!(h.len(), 4);
        for row in h.a.row_iter() {
            assert!((row.norm() - 1.0).abs() < 1e-12);
        }
        assert!(h.b.iter().all(|&b| (b - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_cube_merges_triangulated_faces() {
        let h = QuickHull::new().half_spaces(&cube_corners(3)).unwrap();
        assert_eq!(h.len(), 6, "a cube has six faces");
        assert!(h.contains(&[0.9, -0.9, 0.0], 1e-12));
        assert!(!h.contains(&[1.1, 0.0, 0.0], 1e-12));
    }

    #[test]
    fn test_interior_points_are_ignored() {
        let mut rows = vec![0.0, 0.0, 0.2, 0.1, -0.3, 0.4];
        rows.extend_from_slice(cube_corners(2).transpose().as_slice());
        let pts = DMatrix::from_row_slice(rows.len() / 2, 2, &rows);
        let h = QuickHull::new().half_spaces(&pts).unwrap();
        assert_eq!(h.len(), 4);
    }

    #[test]
    fn test_all_points_satisfy_constraints() {
        let mut rng = fastrand::Rng::with_seed(9);
        let pts = DMatrix::from_fn(60, 3, |_, _| rng.f64() * 2.0 - 1.0);
        let h = QuickHull::new().half_spaces(&pts).unwrap();
        for row in pts.row_iter() {
            let y: Vec<f64> = row.iter().copied().collect();
            assert!(h.max_violation(&y) <= 1e-9);
        }
        // Every facet touches the point set.
        for (a, &b) in h.a.row_iter().zip(h.b.iter()) {
            let support = pts
                .row_iter()
                .map(|p| p.dot(&a))
                .fold(f64::NEG_INFINITY, f64::max);
            assert!((support - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let pts = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        let err = QuickHull::new().half_spaces(&pts).unwrap_err();
        assert!(matches!(err, Error::DegenerateHull { rank: 1, required: 2 }));
    }

    #[test]
    fn test_one_dimensional_interval() {
        let pts = DMatrix::from_row_slice(3, 1, &[-2.0, 0.5, 3.0]);
        let h = QuickHull::new().half_spaces(&pts).unwrap();
        assert!(h.contains(&[2.9], 0.0));
        assert!(!h.contains(&[-2.1], 0.0));
    }
}
