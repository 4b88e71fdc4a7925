// Redundancy analysis pipeline
//
// Normalize → vectorize (TF-IDF + categorical) → cluster (K-means)
// → score within clusters → assemble rows in input order

mod clustering;
mod normalizer;
mod report;
mod scorer;
mod similarity;
mod types;
mod vectorizer;

pub use clustering::{ClusterAssignment, ClusterCountPolicy, ClusterEngine, KMeans, KMeansResult};
pub use normalizer::{clean_text, normalize, normalize_all, normalize_parsed};
pub use report::{assemble_rows, corpus_digest, AnalysisReport};
pub use scorer::{RedundancyScorer, ScoringOutcome};
pub use similarity::{cosine_similarity, euclidean_distance, SimilarityMatrix};
pub use types::{
    AnalysisStats, Assessment, Cluster, FeatureVector, NormalizedRecord, ParsedTestCase,
    RecommendedAction, RecordError, RecordErrorKind, RedundancyRecord, RedundantPair,
};
pub use vectorizer::{Tokenizer, Vectorizer, Vocabulary, CATEGORICAL_DIM};

use crate::config::Config;
use crate::error::Result;
use crate::records::RawTestCase;
use std::time::Instant;

/// Main analysis orchestrator
///
/// Holds the configured stages; every run is independent and the same input
/// with the same configuration always yields the same rows.
pub struct AnalysisPipeline {
    vectorizer: Vectorizer,
    engine: ClusterEngine,
    scorer: RedundancyScorer,
}

impl AnalysisPipeline {
    /// Create the pipeline from a validated configuration
    ///
    /// Fails only when the token pattern does not compile.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            vectorizer: Vectorizer::new(&config.vectorizer)?,
            engine: ClusterEngine::new(&config.clustering),
            scorer: RedundancyScorer::new(&config.redundancy),
        })
    }

    /// Analyze a batch of exported test cases
    ///
    /// Rejected records are reported next to the rows and never abort the run.
    pub fn run(&self, raw: &[RawTestCase]) -> AnalysisReport {
        let start = Instant::now();
        let normalized = normalize_all(raw);
        self.analyze(start, raw.len(), normalized)
    }

    /// Analyze export entries as produced by the ingestion layer
    ///
    /// Entries the parser could not read keep their input position in the
    /// rejected list.
    pub fn run_parsed(&self, entries: &[ParsedTestCase]) -> AnalysisReport {
        let start = Instant::now();
        let normalized = normalize_parsed(entries);
        self.analyze(start, entries.len(), normalized)
    }

    fn analyze(
        &self,
        start: Instant,
        input_records: usize,
        (records, rejected): (Vec<NormalizedRecord>, Vec<RecordError>),
    ) -> AnalysisReport {
        let mut stats = AnalysisStats {
            input_records,
            ..Default::default()
        };

        // Stage 1 (normalize) ran in run / run_parsed
        stats.rejected_records = rejected.len();
        stats.analyzed_records = records.len();
        tracing::info!(
            "Normalized {} test cases ({} rejected)",
            records.len(),
            rejected.len()
        );

        let corpus_digest = corpus_digest(&records);

        if records.is_empty() {
            stats.kmeans_converged = true;
            stats.processing_time_ms = start.elapsed().as_millis() as u64;
            return AnalysisReport {
                generated_at: chrono::Utc::now().to_rfc3339(),
                corpus_digest,
                similarity_threshold: self.scorer.threshold(),
                rejected,
                stats,
                ..Default::default()
            };
        }

        // Stage 2: vectorize
        let vocabulary = self.vectorizer.build_vocabulary(&records);
        let vectors = self.vectorizer.vectorize_all(&vocabulary, &records);
        stats.vocabulary_size = vocabulary.len();
        stats.vector_dimension = Vectorizer::dimension(&vocabulary);
        tracing::debug!(
            "Vocabulary: {} terms, vector dimension {}",
            stats.vocabulary_size,
            stats.vector_dimension
        );

        let empty_text = vectors.iter().filter(|v| v.is_zero()).count();
        if empty_text > 0 {
            tracing::debug!("{} test cases have no vocabulary terms", empty_text);
        }

        // Stage 3: cluster
        let assignment = self.engine.cluster(&records, &vectors);
        stats.cluster_count = assignment.clusters.len();
        stats.singleton_clusters = assignment.singleton_count();
        stats.kmeans_iterations = assignment.iterations;
        stats.kmeans_converged = assignment.converged;
        if !assignment.converged {
            tracing::warn!(
                "K-means stopped after {} iterations without converging",
                assignment.iterations
            );
        }
        tracing::info!(
            "Grouped into {} clusters ({} singletons)",
            stats.cluster_count,
            stats.singleton_clusters
        );

        // Stage 4: score
        let outcome = self.scorer.score(&assignment.clusters, &vectors, &records);
        stats.redundant_pairs = outcome.pairs.len();

        // Stage 5: assemble
        let rows = assemble_rows(&records, &assignment, &outcome);
        for assessment in &outcome.assessments {
            stats.count_action(assessment.action);
        }

        stats.processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Analysis complete: {} rows, {} redundant pairs in {}ms",
            rows.len(),
            stats.redundant_pairs,
            stats.processing_time_ms
        );

        AnalysisReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            corpus_digest,
            similarity_threshold: self.scorer.threshold(),
            rows,
            pairs: outcome.pairs,
            clusters: assignment.clusters,
            rejected,
            stats,
        }
    }
}
