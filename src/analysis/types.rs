// Shared types for the analysis pipeline
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::records::{Priority, RawTestCase, TestingLevel};

/// A test case in canonical comparable form
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// Identifier, unique within the run
    pub id: String,
    /// Position in the original input (before rejected records were dropped)
    pub input_index: usize,
    /// Trimmed title as exported
    pub title: String,
    /// Lower-cased, whitespace-collapsed title + steps + expected result
    pub text: String,
    pub priority: Priority,
    pub core_dependency: bool,
    pub testing_level: TestingLevel,
    pub labels: Vec<String>,
}

/// Numeric representation of one test case
///
/// Text subspace first (TF-IDF over the run's vocabulary), categorical
/// subspace after it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f32>,
    /// Length of the text subspace; the categorical part starts here
    pub text_dim: usize,
}

impl FeatureVector {
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Text subspace only
    pub fn text_part(&self) -> &[f32] {
        &self.values[..self.text_dim]
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }
}

/// A group of test cases judged similar enough to compare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: usize,
    /// Member identifiers in input order
    pub members: Vec<String>,
    /// Positions of the members in the analyzed record list
    #[serde(skip)]
    pub indices: Vec<usize>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Two members of the same cluster whose similarity exceeds the threshold
///
/// Carries both sides' attributes so the listing reads without the rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedundantPair {
    pub cluster_id: usize,
    pub first: String,
    pub second: String,
    pub similarity: f32,
    pub first_title: String,
    pub second_title: String,
    pub first_priority: Priority,
    pub second_priority: Priority,
    pub first_core_dependency: bool,
    pub second_core_dependency: bool,
    pub first_testing_level: TestingLevel,
    pub second_testing_level: TestingLevel,
    pub first_labels: Vec<String>,
    pub second_labels: Vec<String>,
}

/// Advisory outcome for a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendedAction {
    /// Singleton cluster
    KeepNoDuplicate,
    /// Best match at or below the threshold
    KeepNoOverlap,
    /// Core dependency duplicated by a non-core case
    KeepCoreDependency,
    ReviewForConsolidation,
    CandidateForRemoval,
}

impl RecommendedAction {
    pub const ALL: [RecommendedAction; 5] = [
        Self::KeepNoDuplicate,
        Self::KeepNoOverlap,
        Self::KeepCoreDependency,
        Self::ReviewForConsolidation,
        Self::CandidateForRemoval,
    ];

    /// Fixed report text
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepNoDuplicate => "Keep — no duplicate found in corpus.",
            Self::KeepNoOverlap => "Keep — no significant overlap detected.",
            Self::KeepCoreDependency => {
                "Keep (core dependency); review counterpart for removal."
            }
            Self::ReviewForConsolidation => "Review for consolidation",
            Self::CandidateForRemoval => "Candidate for removal (lower priority duplicate).",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best match and recommendation for one test case, before report assembly
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub best_match: Option<String>,
    pub best_similarity: Option<f32>,
    pub action: RecommendedAction,
}

/// One report row per accepted test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedundancyRecord {
    pub test_case_id: String,
    pub cluster_id: usize,
    pub best_match_id: Option<String>,
    pub best_match_similarity: Option<f32>,
    pub core_dependency: bool,
    pub testing_level: TestingLevel,
    pub priority: Priority,
    pub labels: Vec<String>,
    pub recommended_action: String,
}

/// Why a record was excluded from the run
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RecordErrorKind {
    #[error("required field is missing")]
    MissingField,
    #[error("identifier already used by an earlier test case")]
    DuplicateIdentifier,
    /// The record object could not be read as a test case (wrong field type,
    /// repeated field)
    #[error("unreadable record: {0}")]
    Unreadable(String),
}

/// A rejected input record, reported alongside the successful rows
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("test case {test_case_id} rejected ({field}): {kind}")]
pub struct RecordError {
    /// Identifier, or `#<position>` when the identifier itself is missing
    pub test_case_id: String,
    pub input_index: usize,
    pub field: String,
    pub kind: RecordErrorKind,
}

/// One entry of an export: a readable test case, or the reason it was not
pub type ParsedTestCase = std::result::Result<RawTestCase, RecordError>;

/// Counters and timings for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub input_records: usize,
    pub rejected_records: usize,
    pub analyzed_records: usize,
    pub vocabulary_size: usize,
    pub vector_dimension: usize,
    pub cluster_count: usize,
    pub singleton_clusters: usize,
    pub kmeans_iterations: usize,
    pub kmeans_converged: bool,
    pub redundant_pairs: usize,
    pub keep_no_duplicate: usize,
    pub keep_no_overlap: usize,
    pub keep_core_dependency: usize,
    pub review_for_consolidation: usize,
    pub candidate_for_removal: usize,
    pub processing_time_ms: u64,
}

impl AnalysisStats {
    /// Bump the counter matching an action
    pub fn count_action(&mut self, action: RecommendedAction) {
        match action {
            RecommendedAction::KeepNoDuplicate => self.keep_no_duplicate += 1,
            RecommendedAction::KeepNoOverlap => self.keep_no_overlap += 1,
            RecommendedAction::KeepCoreDependency => self.keep_core_dependency += 1,
            RecommendedAction::ReviewForConsolidation => self.review_for_consolidation += 1,
            RecommendedAction::CandidateForRemoval => self.candidate_for_removal += 1,
        }
    }
}
