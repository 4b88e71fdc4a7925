// Redundancy scoring within clusters
// Best match per member, recommended action, and the redundant pair listing
use crate::analysis::similarity::SimilarityMatrix;
use crate::analysis::types::{
    Assessment, Cluster, FeatureVector, NormalizedRecord, RecommendedAction, RedundantPair,
};
use crate::config::RedundancyConfig;

/// Output of the scorer, indexed like the analyzed records
#[derive(Debug, Clone, Default)]
pub struct ScoringOutcome {
    pub assessments: Vec<Assessment>,
    /// Above-threshold pairs in input order of their first member
    pub pairs: Vec<RedundantPair>,
}

/// Applies the redundancy threshold and the priority/core-dependency rules
pub struct RedundancyScorer {
    threshold: f32,
}

impl RedundancyScorer {
    pub fn new(config: &RedundancyConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Score every cluster
    ///
    /// # Arguments
    /// * `clusters` - Partition of the records (indices into `records`)
    /// * `vectors` - Feature vectors, same order as `records`
    /// * `records` - Normalized records for the categorical attributes
    pub fn score(
        &self,
        clusters: &[Cluster],
        vectors: &[FeatureVector],
        records: &[NormalizedRecord],
    ) -> ScoringOutcome {
        let mut assessments: Vec<Option<Assessment>> = vec![None; records.len()];
        let mut pairs = Vec::new();

        for cluster in clusters {
            if cluster.indices.len() < 2 {
                for &i in &cluster.indices {
                    assessments[i] = Some(Assessment {
                        best_match: None,
                        best_similarity: None,
                        action: RecommendedAction::KeepNoDuplicate,
                    });
                }
                continue;
            }

            let matrix = SimilarityMatrix::compute(vectors, &cluster.indices);

            for &i in &cluster.indices {
                let (best, similarity) = Self::best_match(i, &cluster.indices, &matrix, records);
                let action = self.recommend(&records[i], &records[best], similarity);
                assessments[i] = Some(Assessment {
                    best_match: Some(records[best].id.clone()),
                    best_similarity: Some(similarity),
                    action,
                });
            }

            pairs.extend(self.redundant_pairs(cluster, &matrix, records));
        }

        pairs.sort_by_key(|pair| pair.order);

        ScoringOutcome {
            assessments: assessments
                .into_iter()
                .map(|a| {
                    a.unwrap_or(Assessment {
                        best_match: None,
                        best_similarity: None,
                        action: RecommendedAction::KeepNoDuplicate,
                    })
                })
                .collect(),
            pairs: pairs.into_iter().map(|p| p.pair).collect(),
        }
    }

    /// Highest-similarity other member; ties go to the lower identifier
    fn best_match(
        i: usize,
        members: &[usize],
        matrix: &SimilarityMatrix,
        records: &[NormalizedRecord],
    ) -> (usize, f32) {
        let mut best: Option<(usize, f32)> = None;

        for &j in members.iter().filter(|&&j| j != i) {
            let score = matrix.get(i, j).unwrap_or(0.0);
            best = match best {
                None => Some((j, score)),
                Some((b, best_score)) => {
                    if score > best_score
                        || (score == best_score && records[j].id < records[b].id)
                    {
                        Some((j, score))
                    } else {
                        Some((b, best_score))
                    }
                }
            };
        }

        // Callers only pass clusters with two or more members
        best.unwrap_or((i, 0.0))
    }

    /// Recommended action for `case` given its best match, first rule wins
    pub fn recommend(
        &self,
        case: &NormalizedRecord,
        best: &NormalizedRecord,
        similarity: f32,
    ) -> RecommendedAction {
        if similarity <= self.threshold {
            return RecommendedAction::KeepNoOverlap;
        }

        if case.core_dependency && !best.core_dependency {
            RecommendedAction::KeepCoreDependency
        } else if case.core_dependency == best.core_dependency {
            RecommendedAction::ReviewForConsolidation
        } else if case.priority.is_lower_than(best.priority) {
            RecommendedAction::CandidateForRemoval
        } else {
            // Non-core duplicate of a core case with equal or higher priority
            RecommendedAction::ReviewForConsolidation
        }
    }

    fn redundant_pairs(
        &self,
        cluster: &Cluster,
        matrix: &SimilarityMatrix,
        records: &[NormalizedRecord],
    ) -> Vec<OrderedPair> {
        let mut pairs = Vec::new();

        for (pos, &i) in cluster.indices.iter().enumerate() {
            for &j in &cluster.indices[pos + 1..] {
                let similarity = matrix.get(i, j).unwrap_or(0.0);
                if similarity <= self.threshold {
                    continue;
                }

                let (a, b) = (&records[i], &records[j]);
                pairs.push(OrderedPair {
                    order: (i, j),
                    pair: RedundantPair {
                        cluster_id: cluster.id,
                        first: a.id.clone(),
                        second: b.id.clone(),
                        similarity,
                        first_title: a.title.clone(),
                        second_title: b.title.clone(),
                        first_priority: a.priority,
                        second_priority: b.priority,
                        first_core_dependency: a.core_dependency,
                        second_core_dependency: b.core_dependency,
                        first_testing_level: a.testing_level,
                        second_testing_level: b.testing_level,
                        first_labels: a.labels.clone(),
                        second_labels: b.labels.clone(),
                    },
                });
            }
        }

        pairs
    }
}

/// Pair tagged with record positions so the listing follows input order
struct OrderedPair {
    order: (usize, usize),
    pair: RedundantPair,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Priority, TestingLevel};

    fn record(id: &str, priority: Priority, core: bool) -> NormalizedRecord {
        NormalizedRecord {
            id: id.to_string(),
            input_index: 0,
            title: format!("Title of {}", id),
            text: String::new(),
            priority,
            core_dependency: core,
            testing_level: TestingLevel::System,
            labels: vec![format!("{}-label", id)],
        }
    }

    fn fv(values: Vec<f32>) -> FeatureVector {
        let text_dim = values.len();
        FeatureVector { values, text_dim }
    }

    fn cluster(id: usize, records: &[NormalizedRecord], indices: Vec<usize>) -> Cluster {
        Cluster {
            id,
            members: indices.iter().map(|&i| records[i].id.clone()).collect(),
            indices,
        }
    }

    fn scorer() -> RedundancyScorer {
        RedundancyScorer::new(&RedundancyConfig::default())
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let s = scorer();
        let a = record("a", Priority::High, false);
        let b = record("b", Priority::High, false);

        assert_eq!(s.recommend(&a, &b, 0.75), RecommendedAction::KeepNoOverlap);
        assert_eq!(
            s.recommend(&a, &b, 0.750001),
            RecommendedAction::ReviewForConsolidation
        );
    }

    #[test]
    fn test_core_dependency_rules() {
        let s = scorer();
        let core = record("core", Priority::Medium, true);
        let plain = record("plain", Priority::Medium, false);
        let plain_low = record("plain-low", Priority::Low, false);

        assert_eq!(
            s.recommend(&core, &plain, 0.95),
            RecommendedAction::KeepCoreDependency
        );
        assert_eq!(
            s.recommend(&plain, &core, 0.95),
            RecommendedAction::ReviewForConsolidation
        );
        assert_eq!(
            s.recommend(&plain_low, &core, 0.95),
            RecommendedAction::CandidateForRemoval
        );
    }

    #[test]
    fn test_both_core_or_neither_is_review() {
        let s = scorer();
        let low = record("low", Priority::Low, false);
        let high = record("high", Priority::High, false);
        let core_low = record("cl", Priority::Low, true);
        let core_high = record("ch", Priority::High, true);

        // Consolidation rule comes before the priority rule
        assert_eq!(
            s.recommend(&low, &high, 0.9),
            RecommendedAction::ReviewForConsolidation
        );
        assert_eq!(
            s.recommend(&core_low, &core_high, 0.9),
            RecommendedAction::ReviewForConsolidation
        );
    }

    #[test]
    fn test_singleton_cluster() {
        let records = vec![record("solo", Priority::High, false)];
        let vectors = vec![fv(vec![1.0, 0.0])];
        let clusters = vec![cluster(0, &records, vec![0])];

        let outcome = scorer().score(&clusters, &vectors, &records);

        assert_eq!(outcome.assessments.len(), 1);
        assert_eq!(
            outcome.assessments[0].action,
            RecommendedAction::KeepNoDuplicate
        );
        assert!(outcome.assessments[0].best_match.is_none());
        assert!(outcome.assessments[0].best_similarity.is_none());
        assert!(outcome.pairs.is_empty());
    }

    #[test]
    fn test_best_match_and_pairs() {
        let records = vec![
            record("a", Priority::High, true),
            record("b", Priority::High, false),
            record("c", Priority::Low, false),
        ];
        let vectors = vec![
            fv(vec![1.0, 0.0, 0.0]),
            fv(vec![1.0, 0.05, 0.0]),
            fv(vec![0.0, 0.0, 1.0]),
        ];
        let clusters = vec![cluster(0, &records, vec![0, 1, 2])];

        let outcome = scorer().score(&clusters, &vectors, &records);

        assert_eq!(outcome.assessments[0].best_match.as_deref(), Some("b"));
        assert_eq!(
            outcome.assessments[0].action,
            RecommendedAction::KeepCoreDependency
        );
        assert_eq!(outcome.assessments[1].best_match.as_deref(), Some("a"));
        assert_eq!(
            outcome.assessments[2].action,
            RecommendedAction::KeepNoOverlap
        );

        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.pairs[0].first, "a");
        assert_eq!(outcome.pairs[0].second, "b");
        assert!(outcome.pairs[0].first_core_dependency);
        assert_eq!(outcome.pairs[0].first_title, "Title of a");
        assert_eq!(outcome.pairs[0].second_title, "Title of b");
        assert_eq!(outcome.pairs[0].first_testing_level, TestingLevel::System);
        assert_eq!(outcome.pairs[0].second_testing_level, TestingLevel::System);
        assert_eq!(outcome.pairs[0].first_labels, vec!["a-label".to_string()]);
        assert_eq!(outcome.pairs[0].second_labels, vec!["b-label".to_string()]);
    }

    #[test]
    fn test_best_match_tie_breaks_by_identifier() {
        let records = vec![
            record("x", Priority::High, false),
            record("m", Priority::High, false),
            record("b", Priority::High, false),
        ];
        // m and b are equally similar to x
        let vectors = vec![
            fv(vec![1.0, 0.0]),
            fv(vec![1.0, 1.0]),
            fv(vec![1.0, 1.0]),
        ];
        let clusters = vec![cluster(0, &records, vec![0, 1, 2])];

        let outcome = scorer().score(&clusters, &vectors, &records);

        assert_eq!(outcome.assessments[0].best_match.as_deref(), Some("b"));
    }

    #[test]
    fn test_pairs_follow_input_order_across_clusters() {
        let records = vec![
            record("p", Priority::High, false),
            record("q", Priority::High, false),
            record("r", Priority::High, false),
            record("s", Priority::High, false),
        ];
        let vectors = vec![
            fv(vec![1.0, 0.0]),
            fv(vec![0.0, 1.0]),
            fv(vec![1.0, 0.0]),
            fv(vec![0.0, 1.0]),
        ];
        // Second cluster listed first on purpose
        let clusters = vec![
            cluster(1, &records, vec![1, 3]),
            cluster(0, &records, vec![0, 2]),
        ];

        let outcome = scorer().score(&clusters, &vectors, &records);

        let firsts: Vec<&str> = outcome.pairs.iter().map(|p| p.first.as_str()).collect();
        assert_eq!(firsts, vec!["p", "q"]);
    }
}
