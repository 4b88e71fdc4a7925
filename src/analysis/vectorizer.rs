// Feature vectorization: TF-IDF text subspace + categorical subspace
//
// Two explicit phases: build an immutable Vocabulary over the whole corpus,
// then map every record through it.
use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use regex::Regex;

use crate::analysis::types::{FeatureVector, NormalizedRecord};
use crate::config::VectorizerConfig;
use crate::error::{Result, SuiteTrimError};
use crate::records::{Priority, TestingLevel};

/// Categorical slots: known priorities, core flag, known testing levels.
/// Unknown buckets encode as all zeros.
pub const CATEGORICAL_DIM: usize = (Priority::ALL.len() - 1) + 1 + (TestingLevel::ALL.len() - 1);

/// Splits normalized text into terms
#[derive(Debug, Clone)]
pub struct Tokenizer {
    regex: Regex,
}

impl Tokenizer {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| SuiteTrimError::Config(format!("Invalid token pattern: {}", e)))?;
        Ok(Self { regex })
    }

    pub fn tokens<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.regex.find_iter(text).map(|m| m.as_str())
    }
}

/// Corpus vocabulary with smoothed inverse document frequencies
///
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Terms in lexicographic order; position = vector index
    terms: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f32>,
    document_count: usize,
}

impl Vocabulary {
    /// Build the vocabulary over every record's text
    ///
    /// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, so a term present in every
    /// document still carries weight and identical documents stay comparable.
    pub fn build(
        records: &[NormalizedRecord],
        tokenizer: &Tokenizer,
        config: &VectorizerConfig,
    ) -> Self {
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        let mut corpus_frequency: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in tokenizer.tokens(&record.text) {
                *corpus_frequency.entry(token).or_insert(0) += 1;
                if seen.insert(token) {
                    *document_frequency.entry(token).or_insert(0) += 1;
                }
            }
        }

        let mut candidates: Vec<(&str, usize)> = document_frequency
            .iter()
            .filter(|(_, &df)| df >= config.min_document_frequency)
            .map(|(&term, _)| (term, corpus_frequency.get(term).copied().unwrap_or(0)))
            .collect();

        if config.max_features > 0 && candidates.len() > config.max_features {
            // Most frequent first, ties broken lexicographically
            candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            candidates.truncate(config.max_features);
        }

        let mut terms: Vec<String> = candidates.into_iter().map(|(t, _)| t.to_string()).collect();
        terms.sort();

        let n = records.len() as f32;
        let idf = terms
            .iter()
            .map(|term| {
                let df = document_frequency.get(term.as_str()).copied().unwrap_or(0) as f32;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let index = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        Self {
            terms,
            index,
            idf,
            document_count: records.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn idf(&self, index: usize) -> f32 {
        self.idf[index]
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Turns normalized records into fixed-dimension feature vectors
pub struct Vectorizer {
    tokenizer: Tokenizer,
    config: VectorizerConfig,
}

impl Vectorizer {
    pub fn new(config: &VectorizerConfig) -> Result<Self> {
        Ok(Self {
            tokenizer: Tokenizer::new(&config.token_pattern)?,
            config: config.clone(),
        })
    }

    /// Phase 1: corpus-wide vocabulary
    pub fn build_vocabulary(&self, records: &[NormalizedRecord]) -> Vocabulary {
        Vocabulary::build(records, &self.tokenizer, &self.config)
    }

    /// Total vector length for a vocabulary
    pub fn dimension(vocabulary: &Vocabulary) -> usize {
        vocabulary.len() + CATEGORICAL_DIM
    }

    /// Phase 2: map one record through the vocabulary
    ///
    /// A record with no vocabulary terms gets an all-zero vector; categorical
    /// attributes alone never make two cases look alike.
    pub fn vectorize(&self, vocabulary: &Vocabulary, record: &NormalizedRecord) -> FeatureVector {
        let text_dim = vocabulary.len();
        let mut values = vec![0.0f32; text_dim + CATEGORICAL_DIM];

        for token in self.tokenizer.tokens(&record.text) {
            if let Some(i) = vocabulary.term_index(token) {
                values[i] += 1.0;
            }
        }

        for (i, value) in values[..text_dim].iter_mut().enumerate() {
            if *value > 0.0 {
                *value *= vocabulary.idf(i);
            }
        }

        let norm = values[..text_dim].iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return FeatureVector { values, text_dim };
        }
        for value in values[..text_dim].iter_mut() {
            *value /= norm;
        }

        self.encode_categorical(record, &mut values[text_dim..]);

        FeatureVector { values, text_dim }
    }

    /// Vectorize every record, preserving order
    pub fn vectorize_all(
        &self,
        vocabulary: &Vocabulary,
        records: &[NormalizedRecord],
    ) -> Vec<FeatureVector> {
        records
            .iter()
            .map(|record| self.vectorize(vocabulary, record))
            .collect()
    }

    fn encode_categorical(&self, record: &NormalizedRecord, slots: &mut [f32]) {
        let weight = self.config.categorical_weight;
        let priority_slots = Priority::ALL.len() - 1;

        if record.priority != Priority::Unknown {
            slots[record.priority.code()] = weight;
        }
        if record.core_dependency {
            slots[priority_slots] = weight;
        }
        if record.testing_level != TestingLevel::Unknown {
            slots[priority_slots + 1 + record.testing_level.code()] = weight;
        }
    }
}
