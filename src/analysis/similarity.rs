// Similarity and distance over feature vectors
//
// Redundancy decisions use cosine similarity; the cluster engine groups by
// Euclidean distance over the same space. The two are deliberately different.
use ahash::{HashMap, HashMapExt};

use crate::analysis::types::FeatureVector;

/// Cosine similarity clamped to [0, 1]
///
/// Zero-norm vectors and mismatched dimensions score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        (dot / (mag_a * mag_b)).clamp(0.0, 1.0)
    }
}

/// Euclidean distance between two vectors
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean_distance(a, b).sqrt()
}

pub fn squared_euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum()
}

/// Pairwise cosine similarities for a subset of vectors
///
/// Only the upper triangle is computed; lookups are symmetric and the
/// diagonal is never stored.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    scores: HashMap<(usize, usize), f32>,
}

impl SimilarityMatrix {
    /// Compute similarities between every pair of `members`
    ///
    /// # Arguments
    /// * `vectors` - All vectors of the run
    /// * `members` - Indices into `vectors` to compare
    pub fn compute(vectors: &[FeatureVector], members: &[usize]) -> Self {
        let mut scores = HashMap::with_capacity(members.len() * members.len() / 2);

        for (pos, &i) in members.iter().enumerate() {
            for &j in &members[pos + 1..] {
                let score = cosine_similarity(&vectors[i].values, &vectors[j].values);
                scores.insert(Self::key(i, j), score);
            }
        }

        Self { scores }
    }

    /// Similarity of two distinct indices; None for i == j or unknown pairs
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i == j {
            return None;
        }
        self.scores.get(&Self::key(i, j)).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn key(i: usize, j: usize) -> (usize, usize) {
        if i < j {
            (i, j)
        } else {
            (j, i)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: Vec<f32>) -> FeatureVector {
        let text_dim = values.len();
        FeatureVector { values, text_dim }
    }

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_symmetric_and_bounded() {
        let a = [0.3, 0.0, 0.7, 0.1];
        let b = [0.5, 0.2, 0.0, 0.9];
        let ab = cosine_similarity(&a, &b);
        let ba = cosine_similarity(&b, &a);

        assert_eq!(ab, ba);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_euclidean_distance() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(squared_euclidean_distance(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_matrix_symmetric_lookup() {
        let vectors = vec![
            fv(vec![1.0, 0.0]),
            fv(vec![1.0, 1.0]),
            fv(vec![0.0, 1.0]),
        ];
        let matrix = SimilarityMatrix::compute(&vectors, &[0, 1, 2]);

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
        assert_eq!(matrix.get(0, 2), Some(0.0));
        assert_eq!(matrix.get(1, 1), None);
    }

    #[test]
    fn test_matrix_subset_only() {
        let vectors = vec![fv(vec![1.0]), fv(vec![1.0]), fv(vec![1.0])];
        let matrix = SimilarityMatrix::compute(&vectors, &[0, 2]);

        assert_eq!(matrix.len(), 1);
        assert!(matrix.get(0, 2).is_some());
        assert!(matrix.get(0, 1).is_none());
    }
}
