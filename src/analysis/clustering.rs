//! Cluster Engine - K-means over feature vectors
//!
//! Deterministic K-means: seeded k-means++ initialization, Euclidean
//! assignment with lower-index tie-breaking, bounded iterations.

use crate::analysis::similarity::squared_euclidean_distance;
use crate::analysis::types::{Cluster, FeatureVector, NormalizedRecord};
use crate::config::ClusteringConfig;

// =============================================================================
// Cluster Count Policy
// =============================================================================

/// Chooses K for a corpus of N vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterCountPolicy {
    /// Fixed K; None derives K from N
    pub fixed: Option<usize>,
    pub min_clusters: usize,
    pub max_clusters: usize,
}

impl ClusterCountPolicy {
    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self {
            fixed: config.cluster_count,
            min_clusters: config.min_clusters,
            max_clusters: config.max_clusters,
        }
    }

    /// K for `n` vectors
    ///
    /// Heuristic: `round(sqrt(n / 2))` bounded to `[min_clusters, max_clusters]`.
    /// The result never exceeds `n` and is at least 1 for a non-empty corpus.
    pub fn resolve(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }

        let k = match self.fixed {
            Some(k) => k,
            None => {
                let heuristic = (n as f64 / 2.0).sqrt().round() as usize;
                heuristic.max(self.min_clusters).min(self.max_clusters)
            }
        };

        k.max(1).min(n)
    }
}

impl Default for ClusterCountPolicy {
    fn default() -> Self {
        Self::from_config(&ClusteringConfig::default())
    }
}

// =============================================================================
// K-Means
// =============================================================================

/// Raw K-means output, labels indexed like the input vectors
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Centroid index per vector
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f32>>,
    /// K actually used (after degenerate-case reduction)
    pub k: usize,
    /// Assignment passes performed
    pub iterations: usize,
    /// False when the iteration bound was hit before assignments settled
    pub converged: bool,
    /// Within-cluster sum of squared distances
    pub inertia: f32,
}

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub k: usize,
    pub max_iter: usize,
    /// Seed for centroid initialization
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            k: 5,
            max_iter: 100,
            seed: 42,
        }
    }
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Perform K-means clustering.
    ///
    /// Never fails: an empty input yields an empty result and `k >= n`
    /// gives every vector its own cluster.
    pub fn fit(&self, data: &[FeatureVector]) -> KMeansResult {
        let n_samples = data.len();

        if n_samples == 0 {
            return KMeansResult {
                labels: Vec::new(),
                centroids: Vec::new(),
                k: 0,
                iterations: 0,
                converged: true,
                inertia: 0.0,
            };
        }

        let k = self.k.max(1);
        if k >= n_samples {
            return KMeansResult {
                labels: (0..n_samples).collect(),
                centroids: data.iter().map(|v| v.values.clone()).collect(),
                k: n_samples,
                iterations: 0,
                converged: true,
                inertia: 0.0,
            };
        }

        let mut centroids = self.initialize_centroids_plusplus(data, k);
        let mut labels = vec![usize::MAX; n_samples];
        let mut iterations = 0;
        let mut converged = false;

        for _ in 0..self.max_iter.max(1) {
            iterations += 1;

            let mut changed = false;
            for (i, point) in data.iter().enumerate() {
                let nearest = find_nearest_centroid(&point.values, &centroids);
                if labels[i] != nearest {
                    labels[i] = nearest;
                    changed = true;
                }
            }

            if !changed {
                converged = true;
                break;
            }

            self.update_centroids(data, &labels, &mut centroids);
        }

        if !converged {
            tracing::warn!(
                "K-means stopped at the iteration bound ({}) before converging",
                self.max_iter
            );
        }

        let inertia = data
            .iter()
            .zip(labels.iter())
            .map(|(point, &label)| squared_euclidean_distance(&point.values, &centroids[label]))
            .sum();

        KMeansResult {
            labels,
            centroids,
            k,
            iterations,
            converged,
            inertia,
        }
    }

    /// K-means++ initialization driven by the seed.
    ///
    /// Points already chosen (distance 0) are never picked again while any
    /// other point remains.
    fn initialize_centroids_plusplus(&self, data: &[FeatureVector], k: usize) -> Vec<Vec<f32>> {
        let n_samples = data.len();
        let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);

        let first = (self.draw(0) % n_samples as u64) as usize;
        centroids.push(data[first].values.clone());

        for c in 1..k {
            let distances: Vec<f32> = data
                .iter()
                .map(|point| {
                    centroids
                        .iter()
                        .map(|centroid| squared_euclidean_distance(&point.values, centroid))
                        .fold(f32::INFINITY, f32::min)
                })
                .collect();

            let total: f32 = distances.iter().sum();
            if total == 0.0 {
                // Every point coincides with a centroid already
                let fallback = (self.draw(c as u64) % n_samples as u64) as usize;
                centroids.push(data[fallback].values.clone());
                continue;
            }

            let threshold = self.unit(c as u64) * total;
            let mut cumsum = 0.0;
            let mut selected = None;

            for (i, &dist) in distances.iter().enumerate() {
                if dist == 0.0 {
                    continue;
                }
                cumsum += dist;
                selected = Some(i);
                if cumsum >= threshold {
                    break;
                }
            }

            // `total > 0` guarantees at least one non-zero distance
            let selected = selected.unwrap_or(first);
            centroids.push(data[selected].values.clone());
        }

        centroids
    }

    /// Move each centroid to the mean of its members; empty clusters stay put
    fn update_centroids(&self, data: &[FeatureVector], labels: &[usize], centroids: &mut [Vec<f32>]) {
        let n_features = centroids.first().map(Vec::len).unwrap_or(0);
        let mut sums = vec![vec![0.0f32; n_features]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];

        for (point, &label) in data.iter().zip(labels.iter()) {
            counts[label] += 1;
            for (sum, &value) in sums[label].iter_mut().zip(point.values.iter()) {
                *sum += value;
            }
        }

        for ((centroid, sum), &count) in centroids.iter_mut().zip(sums).zip(counts.iter()) {
            if count > 0 {
                *centroid = sum.into_iter().map(|v| v / count as f32).collect();
            }
        }
    }

    /// Deterministic 64-bit draw for stream `n` (SplitMix64 over seed + n)
    fn draw(&self, n: u64) -> u64 {
        let mut z = self
            .seed
            .wrapping_add(n.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Deterministic draw in [0, 1)
    fn unit(&self, n: u64) -> f32 {
        (self.draw(n) >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Nearest centroid by Euclidean distance; ties go to the lower index
fn find_nearest_centroid(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;

    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean_distance(point, centroid);
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }

    best
}

// =============================================================================
// Cluster Engine
// =============================================================================

/// Final partition of the analyzed records
#[derive(Debug, Clone, Default)]
pub struct ClusterAssignment {
    /// Compact cluster id per record, same order as the records
    pub labels: Vec<usize>,
    /// Clusters ordered by id
    pub clusters: Vec<Cluster>,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: f32,
}

impl ClusterAssignment {
    pub fn singleton_count(&self) -> usize {
        self.clusters.iter().filter(|c| c.is_singleton()).count()
    }
}

/// Runs K-means with the configured policy and builds the partition
pub struct ClusterEngine {
    policy: ClusterCountPolicy,
    max_iterations: usize,
    seed: u64,
}

impl ClusterEngine {
    pub fn new(config: &ClusteringConfig) -> Self {
        Self {
            policy: ClusterCountPolicy::from_config(config),
            max_iterations: config.max_iterations,
            seed: config.seed,
        }
    }

    /// Partition the records
    ///
    /// Cluster ids are renumbered `0..k` in order of first appearance in the
    /// input, so ids do not depend on centroid order.
    pub fn cluster(&self, records: &[NormalizedRecord], vectors: &[FeatureVector]) -> ClusterAssignment {
        let k = self.policy.resolve(vectors.len());
        let result = KMeans::new(k)
            .with_max_iter(self.max_iterations)
            .with_seed(self.seed)
            .fit(vectors);

        tracing::debug!(
            "K-means: k={} iterations={} converged={} inertia={:.4}",
            result.k,
            result.iterations,
            result.converged,
            result.inertia
        );

        let mut remap = vec![usize::MAX; result.k];
        let mut clusters: Vec<Cluster> = Vec::new();
        let mut labels = Vec::with_capacity(records.len());

        for (index, (record, &raw_label)) in records.iter().zip(result.labels.iter()).enumerate() {
            if remap[raw_label] == usize::MAX {
                remap[raw_label] = clusters.len();
                clusters.push(Cluster {
                    id: clusters.len(),
                    members: Vec::new(),
                    indices: Vec::new(),
                });
            }
            let id = remap[raw_label];
            clusters[id].members.push(record.id.clone());
            clusters[id].indices.push(index);
            labels.push(id);
        }

        ClusterAssignment {
            labels,
            clusters,
            iterations: result.iterations,
            converged: result.converged,
            inertia: result.inertia,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Priority, TestingLevel};

    fn fv(values: Vec<f32>) -> FeatureVector {
        let text_dim = values.len();
        FeatureVector { values, text_dim }
    }

    fn record(id: &str) -> NormalizedRecord {
        NormalizedRecord {
            id: id.to_string(),
            input_index: 0,
            title: String::new(),
            text: String::new(),
            priority: Priority::Unknown,
            core_dependency: false,
            testing_level: TestingLevel::Unknown,
            labels: vec![],
        }
    }

    fn two_blobs() -> Vec<FeatureVector> {
        vec![
            fv(vec![0.0, 0.0]),
            fv(vec![10.0, 10.0]),
            fv(vec![0.1, 0.0]),
            fv(vec![10.1, 10.0]),
            fv(vec![0.0, 0.1]),
            fv(vec![10.0, 10.1]),
        ]
    }

    #[test]
    fn test_policy_heuristic() {
        let policy = ClusterCountPolicy::default();

        assert_eq!(policy.resolve(0), 0);
        assert_eq!(policy.resolve(1), 1);
        assert_eq!(policy.resolve(2), 1);
        assert_eq!(policy.resolve(8), 2);
        assert_eq!(policy.resolve(50), 5);
        assert_eq!(policy.resolve(200), 10);
        assert_eq!(policy.resolve(100_000), 50);
    }

    #[test]
    fn test_policy_fixed_never_exceeds_n() {
        let policy = ClusterCountPolicy {
            fixed: Some(5),
            min_clusters: 1,
            max_clusters: 50,
        };

        assert_eq!(policy.resolve(3), 3);
        assert_eq!(policy.resolve(20), 5);
    }

    #[test]
    fn test_kmeans_separates_blobs() {
        let data = two_blobs();
        let result = KMeans::new(2).fit(&data);

        assert_eq!(result.labels.len(), 6);
        assert!(result.converged);
        assert_eq!(result.labels[0], result.labels[2]);
        assert_eq!(result.labels[0], result.labels[4]);
        assert_eq!(result.labels[1], result.labels[3]);
        assert_eq!(result.labels[1], result.labels[5]);
        assert_ne!(result.labels[0], result.labels[1]);
    }

    #[test]
    fn test_kmeans_deterministic() {
        let data = two_blobs();
        let first = KMeans::new(3).with_seed(7).fit(&data);
        let second = KMeans::new(3).with_seed(7).fit(&data);

        assert_eq!(first.labels, second.labels);
        assert_eq!(first.centroids, second.centroids);
    }

    #[test]
    fn test_kmeans_degenerate_k() {
        let data = vec![fv(vec![1.0]), fv(vec![2.0])];
        let result = KMeans::new(5).fit(&data);

        assert_eq!(result.k, 2);
        assert_eq!(result.labels, vec![0, 1]);
    }

    #[test]
    fn test_kmeans_empty() {
        let result = KMeans::new(3).fit(&[]);
        assert!(result.labels.is_empty());
        assert_eq!(result.k, 0);
    }

    #[test]
    fn test_kmeans_iteration_bound() {
        let data = two_blobs();
        let result = KMeans::new(2).with_max_iter(1).fit(&data);

        assert_eq!(result.iterations, 1);
        assert_eq!(result.labels.len(), 6);
    }

    #[test]
    fn test_kmeans_identical_points() {
        let data = vec![fv(vec![1.0, 1.0]); 4];
        let result = KMeans::new(2).fit(&data);

        // Equidistant centroids: every point goes to the lower index
        assert!(result.labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_nearest_centroid_tie_breaks_low() {
        let centroids = vec![vec![0.0], vec![2.0]];
        assert_eq!(find_nearest_centroid(&[1.0], &centroids), 0);
    }

    #[test]
    fn test_engine_compacts_ids_and_partitions() {
        let data = two_blobs();
        let records: Vec<NormalizedRecord> =
            ["a", "b", "c", "d", "e", "f"].iter().map(|id| record(id)).collect();
        let config = ClusteringConfig {
            cluster_count: Some(2),
            ..Default::default()
        };

        let assignment = ClusterEngine::new(&config).cluster(&records, &data);

        // First record always lands in cluster 0
        assert_eq!(assignment.labels[0], 0);
        assert_eq!(assignment.clusters.len(), 2);
        assert_eq!(assignment.clusters[0].members, vec!["a", "c", "e"]);
        assert_eq!(assignment.clusters[1].members, vec!["b", "d", "f"]);
        assert_eq!(assignment.clusters[1].indices, vec![1, 3, 5]);

        let total: usize = assignment.clusters.iter().map(|c| c.size()).sum();
        assert_eq!(total, records.len());
    }
}
