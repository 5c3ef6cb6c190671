//! Two-component principal component analysis.
//!
//! The data is mean-centred and the leading eigenvectors of its scatter
//! matrix are found by power iteration from a seeded start, deflating
//! against components already found. Each component's sign is fixed so
//! its largest-magnitude loading is positive.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::AnalyticsError;

const MAX_POWER_ITERATIONS: usize = 1000;
const CONVERGENCE: f64 = 1e-12;

/// Data projected onto its first two principal components.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// `(x, y)` coordinates, one per sample.
    pub points: Vec<(f64, f64)>,
    /// Unit-length principal axes, in feature space.
    pub components: [Vec<f64>; 2],
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = dot(v, v).sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let p = dot(v, b);
        for (x, y) in v.iter_mut().zip(b) {
            *x -= p * y;
        }
    }
}

/// `Xᵀ X v` without materialising the scatter matrix.
fn scatter_times(centered: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; v.len()];
    for row in centered {
        let s = dot(row, v);
        for (o, x) in out.iter_mut().zip(row) {
            *o += s * x;
        }
    }
    out
}

fn leading_component(centered: &[Vec<f64>], found: &[Vec<f64>], rng: &mut StdRng) -> Vec<f64> {
    let dims = centered[0].len();
    let mut v: Vec<f64> = (0..dims).map(|_| rng.gen_range(-1.0..1.0)).collect();
    orthogonalize(&mut v, found);
    normalize(&mut v);

    for _ in 0..MAX_POWER_ITERATIONS {
        let mut next = scatter_times(centered, &v);
        orthogonalize(&mut next, found);
        if normalize(&mut next) <= CONVERGENCE {
            // No variance left outside `found`.
            break;
        }

        let delta: f64 = next
            .iter()
            .zip(&v)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        v = next;
        if delta <= CONVERGENCE.sqrt() {
            break;
        }
    }

    let pivot = v
        .iter()
        .copied()
        .reduce(|a, b| if b.abs() > a.abs() { b } else { a })
        .unwrap_or(0.0);
    if pivot < 0.0 {
        for x in &mut v {
            *x = -*x;
        }
    }

    v
}

/// Projects the rows of `data` onto their first two principal components.
///
/// # Errors
///
/// Returns [`AnalyticsError::TooFewDimensions`] if there are fewer than two
/// samples or fewer than two features.
#[allow(clippy::cast_precision_loss)]
pub fn project_2d(data: &[Vec<f64>], seed: u64) -> Result<Projection, AnalyticsError> {
    let samples = data.len();
    let features = data.first().map_or(0, Vec::len);
    if samples < 2 || features < 2 {
        return Err(AnalyticsError::TooFewDimensions { samples, features });
    }

    let mut mean = vec![0.0; features];
    for row in data {
        for (m, x) in mean.iter_mut().zip(row) {
            *m += x;
        }
    }
    for m in &mut mean {
        *m /= samples as f64;
    }

    let centered: Vec<Vec<f64>> = data
        .iter()
        .map(|row| row.iter().zip(&mean).map(|(x, m)| x - m).collect())
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let first = leading_component(&centered, &[], &mut rng);
    let second = leading_component(&centered, std::slice::from_ref(&first), &mut rng);

    let points = centered
        .iter()
        .map(|row| (dot(row, &first), dot(row, &second)))
        .collect();

    Ok(Projection {
        points,
        components: [first, second],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Vec<Vec<f64>> {
        // Spread along (1, 1, 0), a little noise along (1, -1, 0).
        vec![
            vec![-2.0, -2.0, 0.0],
            vec![-1.0, -1.1, 0.0],
            vec![0.0, 0.1, 0.0],
            vec![1.0, 0.9, 0.0],
            vec![2.0, 2.1, 0.0],
        ]
    }

    #[test]
    fn first_component_follows_the_spread() {
        let projection = project_2d(&line(), 42).unwrap();
        let [first, second] = &projection.components;
        let expected = std::f64::consts::FRAC_1_SQRT_2;
        assert!((first[0] - expected).abs() < 1e-2, "{first:?}");
        assert!((first[1] - expected).abs() < 1e-2, "{first:?}");
        assert!(dot(first, second).abs() < 1e-9);
    }

    #[test]
    fn projections_are_centred() {
        let projection = project_2d(&line(), 42).unwrap();
        let sum_x: f64 = projection.points.iter().map(|p| p.0).sum();
        let sum_y: f64 = projection.points.iter().map(|p| p.1).sum();
        assert!(sum_x.abs() < 1e-9);
        assert!(sum_y.abs() < 1e-9);
    }

    #[test]
    fn largest_loading_is_positive() {
        let projection = project_2d(&line(), 3).unwrap();
        for component in &projection.components {
            let pivot = component
                .iter()
                .copied()
                .reduce(|a, b| if b.abs() > a.abs() { b } else { a })
                .unwrap();
            assert!(pivot >= 0.0);
        }
    }

    #[test]
    fn deterministic_for_a_seed() {
        assert_eq!(project_2d(&line(), 42), project_2d(&line(), 42));
    }

    #[test]
    fn one_feature_cannot_be_projected() {
        let data = vec![vec![1.0], vec![2.0], vec![3.0]];
        assert_eq!(
            project_2d(&data, 42).unwrap_err(),
            AnalyticsError::TooFewDimensions {
                samples: 3,
                features: 1
            }
        );
    }

    #[test]
    fn one_sample_cannot_be_projected() {
        assert!(project_2d(&[vec![1.0, 2.0]], 42).is_err());
    }
}
