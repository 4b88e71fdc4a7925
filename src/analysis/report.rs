// Report assembly: one row per analyzed test case, in input order
use serde::{Deserialize, Serialize};

use crate::analysis::clustering::ClusterAssignment;
use crate::analysis::scorer::ScoringOutcome;
use crate::analysis::types::{
    AnalysisStats, Cluster, NormalizedRecord, RecordError, RedundancyRecord, RedundantPair,
};

/// Everything a run produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: String,
    /// BLAKE3 over the normalized corpus; equal digests mean equal input
    pub corpus_digest: String,
    pub similarity_threshold: f32,
    pub rows: Vec<RedundancyRecord>,
    pub pairs: Vec<RedundantPair>,
    pub clusters: Vec<Cluster>,
    pub rejected: Vec<RecordError>,
    pub stats: AnalysisStats,
}

impl AnalysisReport {
    /// Row for a test case identifier
    pub fn row(&self, id: &str) -> Option<&RedundancyRecord> {
        self.rows.iter().find(|row| row.test_case_id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Merge cluster labels and assessments into report rows
///
/// Rows follow the records' input positions, never cluster order.
pub fn assemble_rows(
    records: &[NormalizedRecord],
    assignment: &ClusterAssignment,
    outcome: &ScoringOutcome,
) -> Vec<RedundancyRecord> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| records[i].input_index);

    order
        .into_iter()
        .map(|i| {
            let record = &records[i];
            let assessment = &outcome.assessments[i];
            RedundancyRecord {
                test_case_id: record.id.clone(),
                cluster_id: assignment.labels[i],
                best_match_id: assessment.best_match.clone(),
                best_match_similarity: assessment.best_similarity,
                core_dependency: record.core_dependency,
                testing_level: record.testing_level,
                priority: record.priority,
                labels: record.labels.clone(),
                recommended_action: assessment.action.as_str().to_string(),
            }
        })
        .collect()
}

/// Stable fingerprint of the normalized corpus
pub fn corpus_digest(records: &[NormalizedRecord]) -> String {
    let mut hasher = blake3::Hasher::new();

    for record in records {
        hasher.update(record.id.as_bytes());
        hasher.update(&[0]);
        hasher.update(record.text.as_bytes());
        hasher.update(&[0]);
        hasher.update(&[
            record.priority.code() as u8,
            record.core_dependency as u8,
            record.testing_level.code() as u8,
        ]);
    }

    hasher.finalize().to_hex().to_string()
}
