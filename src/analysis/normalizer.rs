// Record normalization: raw parsed fields -> canonical comparable form
// Pure functions; nothing here touches shared state
use ahash::{HashSet, HashSetExt};

use crate::analysis::types::{NormalizedRecord, ParsedTestCase, RecordError, RecordErrorKind};
use crate::records::{Priority, RawTestCase, TestingLevel};

/// Lower-case and collapse all whitespace runs to a single space
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize one test case
///
/// `identifier` and `title` must be present; an empty title is fine. Every
/// other field falls back to an empty or unknown value.
///
/// # Arguments
/// * `raw` - Test case as delivered by the export parser
/// * `input_index` - Position of the record in the input
pub fn normalize(raw: &RawTestCase, input_index: usize) -> Result<NormalizedRecord, RecordError> {
    let id = raw
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| RecordError {
            test_case_id: format!("#{}", input_index),
            input_index,
            field: "id".to_string(),
            kind: RecordErrorKind::MissingField,
        })?;

    let title = raw.title.as_deref().ok_or_else(|| RecordError {
        test_case_id: id.to_string(),
        input_index,
        field: "title".to_string(),
        kind: RecordErrorKind::MissingField,
    })?;

    let steps = raw
        .steps
        .clone()
        .map(|steps| steps.into_items())
        .unwrap_or_default();
    let expected = raw.expected_result.as_deref().unwrap_or_default();

    // Title, then steps in order, then expected result
    let text = std::iter::once(title)
        .chain(steps.iter().map(String::as_str))
        .chain(std::iter::once(expected))
        .map(clean_text)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let labels = raw
        .labels
        .clone()
        .map(|labels| labels.into_items())
        .unwrap_or_default()
        .into_iter()
        .flat_map(|label| {
            label
                .split(',')
                .map(clean_text)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(NormalizedRecord {
        id: id.to_string(),
        input_index,
        title: title.trim().to_string(),
        text,
        priority: raw
            .priority
            .as_deref()
            .map(Priority::parse)
            .unwrap_or(Priority::Unknown),
        core_dependency: raw
            .core_dependency
            .as_ref()
            .map(|flag| flag.as_bool())
            .unwrap_or(false),
        testing_level: raw
            .testing_level
            .as_deref()
            .map(TestingLevel::parse)
            .unwrap_or(TestingLevel::Unknown),
        labels,
    })
}

/// Normalize a whole export in input order
///
/// Malformed records and repeated identifiers are collected as errors and
/// excluded; the first occurrence of an identifier wins.
///
/// # Returns
/// Tuple of (accepted records, rejected records)
pub fn normalize_all(raw: &[RawTestCase]) -> (Vec<NormalizedRecord>, Vec<RecordError>) {
    normalize_entries(raw.iter().map(Ok::<_, &RecordError>))
}

/// Normalize parsed export entries, keeping records the parser already
/// rejected in the error list at their input position
pub fn normalize_parsed(entries: &[ParsedTestCase]) -> (Vec<NormalizedRecord>, Vec<RecordError>) {
    normalize_entries(entries.iter().map(|entry| entry.as_ref()))
}

fn normalize_entries<'a, I>(entries: I) -> (Vec<NormalizedRecord>, Vec<RecordError>)
where
    I: IntoIterator<Item = Result<&'a RawTestCase, &'a RecordError>>,
{
    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let case = match entry {
            Ok(case) => case,
            Err(err) => {
                tracing::warn!("{}", err);
                errors.push(err.clone());
                continue;
            }
        };

        match normalize(case, index) {
            Ok(record) => {
                if seen.insert(record.id.clone()) {
                    records.push(record);
                } else {
                    tracing::warn!("Duplicate test case identifier {} at #{}", record.id, index);
                    errors.push(RecordError {
                        test_case_id: record.id,
                        input_index: index,
                        field: "id".to_string(),
                        kind: RecordErrorKind::DuplicateIdentifier,
                    });
                }
            }
            Err(err) => {
                tracing::warn!("{}", err);
                errors.push(err);
            }
        }
    }

    (records, errors)
}
