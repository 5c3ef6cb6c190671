//! Seeded k-means clustering.
//!
//! Centroids are seeded with greedy k-means++ (`2 + ln k` candidates per
//! step, keeping the one that lowers the total potential most) and refined
//! with Lloyd iterations until the squared centroid shift drops below the
//! tolerance scaled by the mean feature variance. A cluster that loses all
//! of its points is moved onto the point farthest from its own centroid.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::AnalyticsError;

/// Fitted clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster id of every sample, in `0..k`.
    pub labels: Vec<usize>,
    /// Final centroids.
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances of samples to their centroid.
    pub inertia: f64,
    /// Lloyd iterations run.
    pub iterations: usize,
}

/// k-means parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    clusters: usize,
    seed: u64,
    max_iterations: usize,
    tolerance: f64,
}

impl KMeans {
    /// Creates a clusterer for `clusters` clusters with seed 0.
    #[must_use]
    pub const fn new(clusters: usize) -> Self {
        Self {
            clusters,
            seed: 0,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the relative convergence tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Clusters the rows of `data`.
    ///
    /// # Errors
    ///
    /// * [`AnalyticsError::InvalidClusterCount`] if `k` is zero
    /// * [`AnalyticsError::TooFewSamples`] if there are fewer rows than
    ///   clusters
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<KMeansResult, AnalyticsError> {
        let k = self.clusters;
        if k == 0 {
            return Err(AnalyticsError::InvalidClusterCount { clusters: k });
        }
        if data.len() < k {
            return Err(AnalyticsError::TooFewSamples {
                samples: data.len(),
                clusters: k,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = init_plus_plus(data, k, &mut rng);
        let threshold = self.tolerance * mean_variance(data);

        let mut labels = assign(data, &centroids);
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;

            let updated = update(data, &labels, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .sum();

            centroids = updated;
            labels = assign(data, &centroids);

            if shift <= threshold {
                break;
            }
        }

        let inertia = data
            .iter()
            .zip(&labels)
            .map(|(x, &label)| squared_distance(x, &centroids[label]))
            .sum();

        log::debug!("k-means: {k} clusters, {iterations} iterations, inertia {inertia:.6}");

        Ok(KMeansResult {
            labels,
            centroids,
            inertia,
            iterations,
        })
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[allow(clippy::cast_precision_loss)]
fn mean_variance(data: &[Vec<f64>]) -> f64 {
    let n = data.len() as f64;
    let dims = data.first().map_or(0, Vec::len);
    if dims == 0 {
        return 0.0;
    }

    let total: f64 = (0..dims)
        .map(|j| {
            let mean = data.iter().map(|x| x[j]).sum::<f64>() / n;
            data.iter().map(|x| (x[j] - mean).powi(2)).sum::<f64>() / n
        })
        .sum();

    total / dims as f64
}

/// Index of the first sample whose cumulative weight exceeds `target`.
fn weighted_pick(weights: &[f64], target: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > target {
            return i;
        }
    }
    weights.len() - 1
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn init_plus_plus(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = data.len();
    let trials = 2 + (k as f64).ln().floor() as usize;

    let first = rng.gen_range(0..n);
    let mut centroids = vec![data[first].clone()];
    let mut closest: Vec<f64> = data
        .iter()
        .map(|x| squared_distance(x, &data[first]))
        .collect();
    let mut potential: f64 = closest.iter().sum();

    while centroids.len() < k {
        let mut best: Option<(usize, Vec<f64>, f64)> = None;

        for _ in 0..trials {
            let candidate = if potential > 0.0 {
                weighted_pick(&closest, rng.gen_range(0.0..1.0) * potential)
            } else {
                rng.gen_range(0..n)
            };

            let distances: Vec<f64> = data
                .iter()
                .zip(&closest)
                .map(|(x, &d)| d.min(squared_distance(x, &data[candidate])))
                .collect();
            let candidate_potential: f64 = distances.iter().sum();

            if best
                .as_ref()
                .is_none_or(|(_, _, p)| candidate_potential < *p)
            {
                best = Some((candidate, distances, candidate_potential));
            }
        }

        if let Some((index, distances, candidate_potential)) = best {
            centroids.push(data[index].clone());
            closest = distances;
            potential = candidate_potential;
        }
    }

    centroids
}

/// Nearest centroid per sample; ties go to the lowest id.
fn assign(data: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    data.iter()
        .map(|x| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (i, c) in centroids.iter().enumerate() {
                let d = squared_distance(x, c);
                if d < best_distance {
                    best = i;
                    best_distance = d;
                }
            }
            best
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn update(data: &[Vec<f64>], labels: &[usize], centroids: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let k = centroids.len();
    let dims = data.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dims]; k];
    let mut counts = vec![0_usize; k];

    for (x, &label) in data.iter().zip(labels) {
        counts[label] += 1;
        for (s, v) in sums[label].iter_mut().zip(x) {
            *s += v;
        }
    }

    // ── Relocate empty clusters ──
    let empty: Vec<usize> = (0..k).filter(|&c| counts[c] == 0).collect();
    if !empty.is_empty() {
        let mut far: Vec<usize> = (0..data.len()).collect();
        far.sort_by(|&a, &b| {
            let da = squared_distance(&data[a], &centroids[labels[a]]);
            let db = squared_distance(&data[b], &centroids[labels[b]]);
            db.total_cmp(&da)
        });

        for (cluster, &sample) in empty.iter().zip(&far) {
            log::debug!("k-means: relocating empty cluster {cluster} to sample {sample}");
            sums[*cluster].clone_from(&data[sample]);
            counts[*cluster] = 1;
        }
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| sum.into_iter().map(|s| s / count as f64).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.1],
            vec![0.1, 0.0],
            vec![0.0, 0.0],
            vec![10.0, 10.1],
            vec![10.1, 10.0],
            vec![10.0, 10.0],
        ]
    }

    #[test]
    fn separates_two_blobs() {
        let result = KMeans::new(2).with_seed(42).fit(&blobs()).unwrap();
        let labels = &result.labels;
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
        assert!(result.inertia < 0.1);
    }

    #[test]
    fn same_seed_same_labels() {
        let data = blobs();
        let a = KMeans::new(3).with_seed(7).fit(&data).unwrap();
        let b = KMeans::new(3).with_seed(7).fit(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn labels_stay_in_range_for_duplicate_points() {
        let data = vec![vec![1.0, 1.0]; 5];
        let result = KMeans::new(3).with_seed(42).fit(&data).unwrap();
        assert!(result.labels.iter().all(|&l| l < 3));
        assert_eq!(result.centroids.len(), 3);
    }

    #[test]
    fn fewer_samples_than_clusters_fails() {
        let err = KMeans::new(4).fit(&blobs()[..3]).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::TooFewSamples {
                samples: 3,
                clusters: 4
            }
        );
    }

    #[test]
    fn zero_clusters_fails() {
        assert!(matches!(
            KMeans::new(0).fit(&blobs()),
            Err(AnalyticsError::InvalidClusterCount { clusters: 0 })
        ));
    }

    #[test]
    fn weighted_pick_skips_zero_weights() {
        assert_eq!(weighted_pick(&[0.0, 1.0, 0.0, 1.0], 0.5), 1);
        assert_eq!(weighted_pick(&[0.0, 1.0, 0.0, 1.0], 1.5), 3);
    }
}
