//! Designs and quadrature rules on the bounded active domain.
//!
//! For one active variable the domain is an interval and both designs and
//! quadrature rules come from an even grid. For more active variables the
//! domain is a zonotope described by its vertices and hull facets; designs
//! are greedy maximin point sets drawn from a scrambled Sobol candidate
//! pool, and quadrature weights are Monte Carlo estimates of the mass of
//! the uniform input density that projects nearest to each design point.
//!
//! Every quadrature rule here is normalized to the probability measure of
//! `x ~ U[-1, 1]^m`, so the weights sum to one for any number of points.

use nalgebra::{DMatrix, DVector};
use sobol_burley::sample;

use crate::error::{Error, Result};
use crate::hull::HalfSpaces;
use crate::quadrature::QuadratureRule;
use crate::rng_util;

/// Upper bound on Sobol indices drawn per accepted candidate.
const CANDIDATE_OVERSAMPLING: usize = 64;
/// Highest dimension the scrambled Sobol tables support.
const MAX_SOBOL_DIMENSION: usize = 256;
/// Exchange sweeps after the greedy pass.
const EXCHANGE_SWEEPS: usize = 8;

/// `n` interior points of an even grid on `[yl, yu]`, as an `n × 1` matrix.
///
/// The points are `linspace(yl, yu, n + 2)` without its two endpoints, so
/// the vertices of the interval are never repeated in the design.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if `n` is zero.
///
/// # Examples
///
/// ```
/// use active_subspaces::design::interval_design;
///
/// let y = interval_design(-1.0, 1.0, 3).unwrap();
/// assert_eq!(y.as_slice(), &[-0.5, 0.0, 0.5]);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn interval_design(yl: f64, yu: f64, n: usize) -> Result<DMatrix<f64>> {
    if n == 0 {
        return Err(Error::InvalidArgument("design needs at least one point"));
    }
    let step = (yu - yl) / (n + 1) as f64;
    Ok(DMatrix::from_fn(n, 1, |i, _| yl + step * (i + 1) as f64))
}

/// Midpoint rule on `[yl, yu]` with `n` cells, weighted by the projected
/// uniform density.
///
/// Each weight is the fraction of `n_mc_samples` draws `x ~ U[-1, 1]^m`
/// whose projection `W1ᵗx` lands in that cell. Only the first column of
/// `w1` is used.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if `n` or `n_mc_samples` is zero, or if
/// the interval is empty.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn interval_quadrature_rule(
    w1: &DMatrix<f64>,
    yl: f64,
    yu: f64,
    n: usize,
    n_mc_samples: usize,
    rng: &mut fastrand::Rng,
) -> Result<QuadratureRule> {
    if n == 0 {
        return Err(Error::InvalidArgument("quadrature needs at least one point"));
    }
    if n_mc_samples == 0 {
        return Err(Error::InvalidArgument("quadrature needs at least one Monte Carlo sample"));
    }
    let length = yu - yl;
    if length.is_nan() || length <= 0.0 {
        return Err(Error::InvalidArgument("interval must have positive length"));
    }

    let width = length / n as f64;
    let points = DMatrix::from_fn(n, 1, |i, _| yl + width * (i as f64 + 0.5));

    let projected = rng_util::uniform_box(rng, n_mc_samples, w1.nrows()) * w1.column(0);
    let mut counts = vec![0usize; n];
    for &v in projected.iter() {
        let bin = ((v - yl) / width).floor().max(0.0) as usize;
        counts[bin.min(n - 1)] += 1;
    }
    let total = n_mc_samples as f64;
    let weights = DVector::from_iterator(n, counts.into_iter().map(|c| c as f64 / total));

    Ok(QuadratureRule { points, weights })
}

fn sq_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn rows(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter().map(|r| r.iter().copied().collect()).collect()
}

/// Sobol points in the bounding box of `vertices` that satisfy every hull
/// constraint, up to `n_candidates` of them.
#[allow(clippy::cast_possible_truncation)]
fn candidate_pool(
    vertices: &DMatrix<f64>,
    half_spaces: &HalfSpaces,
    n_candidates: usize,
    seed: u32,
) -> Vec<Vec<f64>> {
    let dim = vertices.ncols();
    let lo: Vec<f64> = (0..dim).map(|j| vertices.column(j).min()).collect();
    let hi: Vec<f64> = (0..dim).map(|j| vertices.column(j).max()).collect();
    let tol = 1e-12 * (1.0 + half_spaces.b.amax());

    let mut pool = Vec::with_capacity(n_candidates);
    let limit = n_candidates.saturating_mul(CANDIDATE_OVERSAMPLING);
    // Index 0 of a scrambled sequence is still a valid point.
    for index in 0..limit.min(u32::MAX as usize) {
        let point: Vec<f64> = (0..dim)
            .map(|d| {
                let u = f64::from(sample(index as u32, d as u32, seed));
                lo[d] + u * (hi[d] - lo[d])
            })
            .collect();
        if half_spaces.contains(&point, tol) {
            pool.push(point);
            if pool.len() == n_candidates {
                break;
            }
        }
    }
    pool
}

/// Index and value of the largest entry.
fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// `n` points inside the polytope `half_spaces` that approximately maximize
/// the minimum distance to each other and to the `vertices`.
///
/// Candidates are scrambled Sobol points (scramble `seed`) in the bounding
/// box of the vertices, filtered by the hull constraints. A greedy
/// farthest-point pass seeded with the vertices picks the initial design,
/// then exchange sweeps replace a design point with a candidate whenever
/// that lengthens the point's nearest-neighbor distance. Exchanges never
/// shorten the overall minimum distance.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if `n` is zero or the dimension exceeds
/// what the Sobol tables support, and `Error::InsufficientData` if fewer
/// than `n` candidates land inside the polytope.
pub fn maximin_design(
    vertices: &DMatrix<f64>,
    half_spaces: &HalfSpaces,
    n: usize,
    n_candidates: usize,
    seed: u32,
) -> Result<DMatrix<f64>> {
    let dim = vertices.ncols();
    if n == 0 {
        return Err(Error::InvalidArgument("design needs at least one point"));
    }
    if dim == 0 || dim > MAX_SOBOL_DIMENSION {
        return Err(Error::InvalidArgument("unsupported design dimension"));
    }
    if half_spaces.dim() != dim {
        return Err(Error::DimensionMismatch {
            expected: dim,
            got: half_spaces.dim(),
        });
    }

    let pool = candidate_pool(vertices, half_spaces, n_candidates.max(n), seed);
    if pool.len() < n {
        return Err(Error::InsufficientData {
            required: n,
            got: pool.len(),
        });
    }
    let anchors = rows(vertices);

    // Squared distance from every candidate to the nearest vertex.
    let mut nearest: Vec<f64> = pool
        .iter()
        .map(|c| {
            anchors
                .iter()
                .map(|v| sq_dist(c, v))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();

    let mut chosen: Vec<usize> = Vec::with_capacity(n);
    for _ in 0..n {
        let Some((best, _)) = argmax(&nearest) else {
            break;
        };
        chosen.push(best);
        for (c, d) in pool.iter().zip(nearest.iter_mut()) {
            *d = d.min(sq_dist(c, &pool[best]));
        }
    }

    // Squared nearest-neighbor distance of `p` to the design without `skip`.
    let clearance = |p: &[f64], design: &[usize], skip: usize| -> f64 {
        let to_design = design
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != skip)
            .map(|(_, &j)| sq_dist(p, &pool[j]))
            .fold(f64::INFINITY, f64::min);
        anchors
            .iter()
            .map(|v| sq_dist(p, v))
            .fold(to_design, f64::min)
    };

    for _ in 0..EXCHANGE_SWEEPS {
        let mut improved = false;
        for k in 0..chosen.len() {
            let current = clearance(&pool[chosen[k]], &chosen, k);
            let scores: Vec<f64> = pool.iter().map(|c| clearance(c, &chosen, k)).collect();
            if let Some((best, score)) = argmax(&scores) {
                if score > current * (1.0 + 1e-12) {
                    chosen[k] = best;
                    improved = true;
                }
            }
        }
        if !improved {
            break;
        }
    }

    Ok(DMatrix::from_fn(chosen.len(), dim, |i, j| pool[chosen[i]][j]))
}

/// Quadrature rule on the zonotope spanned by `vertices`.
///
/// The nodes are an `n`-point [`maximin_design`]. Each weight is the
/// fraction of `n_mc_samples` projected draws `W1ᵗx`, `x ~ U[-1, 1]^m`,
/// whose nearest node is that node, so the weights are non-negative and
/// sum to one.
///
/// # Errors
///
/// Propagates the errors of [`maximin_design`], and returns
/// `Error::InvalidArgument` if `n_mc_samples` is zero.
#[allow(clippy::cast_precision_loss)]
pub fn zonotope_quadrature_rule(
    w1: &DMatrix<f64>,
    vertices: &DMatrix<f64>,
    half_spaces: &HalfSpaces,
    n: usize,
    n_candidates: usize,
    n_mc_samples: usize,
    rng: &mut fastrand::Rng,
) -> Result<QuadratureRule> {
    if n_mc_samples == 0 {
        return Err(Error::InvalidArgument("quadrature needs at least one Monte Carlo sample"));
    }
    if w1.ncols() != vertices.ncols() {
        return Err(Error::DimensionMismatch {
            expected: vertices.ncols(),
            got: w1.ncols(),
        });
    }
    let points = maximin_design(vertices, half_spaces, n, n_candidates, rng.u32(..))?;
    let nodes = rows(&points);

    let projected = rng_util::uniform_box(rng, n_mc_samples, w1.nrows()) * w1;
    let mut counts = vec![0usize; nodes.len()];
    for row in projected.row_iter() {
        let y: Vec<f64> = row.iter().copied().collect();
        let owner = nodes
            .iter()
            .map(|p| sq_dist(p, &y))
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0, |(i, _)| i);
        counts[owner] += 1;
    }
    let total = n_mc_samples as f64;
    let weights = DVector::from_iterator(nodes.len(), counts.into_iter().map(|c| c as f64 / total));

    Ok(QuadratureRule { points, weights })
}
