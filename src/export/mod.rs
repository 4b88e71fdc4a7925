// Reading test-management exports and writing redundancy reports
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::analysis::{AnalysisReport, ParsedTestCase, RecordError, RecordErrorKind};
use crate::error::{Result, SuiteTrimError};
use crate::records::RawTestCase;

/// Identifier keys an exporter may use, in lookup order
const ID_KEYS: [&str; 4] = ["id", "key", "mph", "identifier"];

/// Load test cases from a JSON export on disk
pub fn load_test_cases(path: &Path) -> Result<Vec<ParsedTestCase>> {
    let content = std::fs::read_to_string(path).map_err(|e| SuiteTrimError::Io {
        source: e,
        context: format!("Failed to read test case export: {:?}", path),
    })?;

    let entries = parse_test_cases(&content)?;
    tracing::debug!("Loaded {} test case entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Parse a JSON export
///
/// Either a bare array of test case objects or an object with a
/// `test_cases` array. Only the document shape is fatal; an object that
/// cannot be read as a test case becomes a rejected entry at its position.
pub fn parse_test_cases(content: &str) -> Result<Vec<ParsedTestCase>> {
    let value: Value = serde_json::from_str(content).map_err(|e| SuiteTrimError::Json {
        source: e,
        context: "Test case export is not valid JSON".to_string(),
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut document) => match document.remove("test_cases") {
            Some(Value::Array(items)) => items,
            _ => return Err(shape_error()),
        },
        _ => return Err(shape_error()),
    };

    if let Some(position) = items.iter().position(|item| !item.is_object()) {
        return Err(SuiteTrimError::Input(format!(
            "test case entry #{} is not a JSON object",
            position
        )));
    }

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| read_record(index, item))
        .collect())
}

fn shape_error() -> SuiteTrimError {
    SuiteTrimError::Input(
        "expected a JSON array of test cases or an object with a \"test_cases\" array"
            .to_string(),
    )
}

fn read_record(index: usize, item: Value) -> ParsedTestCase {
    let label = record_label(&item, index);

    serde_json::from_value::<RawTestCase>(item).map_err(|e| RecordError {
        test_case_id: label,
        input_index: index,
        field: "record".to_string(),
        kind: RecordErrorKind::Unreadable(e.to_string()),
    })
}

/// Best-effort identifier for a record that failed to deserialize
fn record_label(item: &Value, index: usize) -> String {
    ID_KEYS
        .iter()
        .filter_map(|key| item.get(*key))
        .find_map(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| format!("#{}", index))
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Table,
}

impl FromStr for ReportFormat {
    type Err = SuiteTrimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            other => Err(SuiteTrimError::InvalidConfigValue {
                path: "output.format".to_string(),
                message: format!("unknown report format '{}' (expected json or table)", other),
            }),
        }
    }
}

/// Render a report
///
/// # Arguments
/// * `report` - Finished analysis report
/// * `format` - JSON document or plain-text table
/// * `include_pairs` - Whether the redundant pair listing is emitted
/// * `writer` - Destination
pub fn write_report<W: Write>(
    report: &AnalysisReport,
    format: ReportFormat,
    include_pairs: bool,
    writer: &mut W,
) -> Result<()> {
    match format {
        ReportFormat::Json => write_json(report, include_pairs, writer),
        ReportFormat::Table => write_table(report, include_pairs, writer).map_err(|e| {
            SuiteTrimError::Io {
                source: e,
                context: "Failed to write report table".to_string(),
            }
        }),
    }
}

fn write_json<W: Write>(report: &AnalysisReport, include_pairs: bool, writer: &mut W) -> Result<()> {
    let serialized = if include_pairs {
        serde_json::to_writer_pretty(&mut *writer, report)
    } else {
        let trimmed = AnalysisReport {
            pairs: Vec::new(),
            ..report.clone()
        };
        serde_json::to_writer_pretty(&mut *writer, &trimmed)
    };

    serialized.map_err(|e| SuiteTrimError::Json {
        source: e,
        context: "Failed to serialize report".to_string(),
    })?;

    writeln!(writer).map_err(|e| SuiteTrimError::Io {
        source: e,
        context: "Failed to write report".to_string(),
    })
}

fn write_table<W: Write>(
    report: &AnalysisReport,
    include_pairs: bool,
    writer: &mut W,
) -> std::io::Result<()> {
    let stats = &report.stats;

    writeln!(
        writer,
        "Analyzed {} of {} test cases into {} clusters (threshold {:.2})",
        stats.analyzed_records, stats.input_records, stats.cluster_count, report.similarity_threshold
    )?;
    writeln!(writer)?;

    let id_width = report
        .rows
        .iter()
        .map(|r| r.test_case_id.len())
        .chain(report.rows.iter().filter_map(|r| r.best_match_id.as_ref().map(|m| m.len())))
        .chain(std::iter::once("TEST CASE".len()))
        .max()
        .unwrap_or(9);

    writeln!(
        writer,
        "{:<id$}  {:>7}  {:<id$}  {:>6}  {:<4}  {:<8}  {:<12}  ACTION",
        "TEST CASE",
        "CLUSTER",
        "BEST MATCH",
        "SIM",
        "CORE",
        "PRIORITY",
        "LEVEL",
        id = id_width
    )?;

    for row in &report.rows {
        let similarity = row
            .best_match_similarity
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "-".to_string());

        writeln!(
            writer,
            "{:<id$}  {:>7}  {:<id$}  {:>6}  {:<4}  {:<8}  {:<12}  {}",
            row.test_case_id,
            row.cluster_id,
            row.best_match_id.as_deref().unwrap_or("-"),
            similarity,
            if row.core_dependency { "yes" } else { "no" },
            row.priority.to_string(),
            row.testing_level.to_string(),
            row.recommended_action,
            id = id_width
        )?;
    }

    if include_pairs && !report.pairs.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Redundant pairs:")?;
        for pair in &report.pairs {
            writeln!(
                writer,
                "  [{}] {} \"{}\" <-> {} \"{}\"  {:.3}",
                pair.cluster_id,
                pair.first,
                pair.first_title,
                pair.second,
                pair.second_title,
                pair.similarity
            )?;
        }
    }

    if !report.rejected.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Rejected records:")?;
        for error in &report.rejected {
            writeln!(writer, "  #{}: {}", error.input_index, error)?;
        }
    }

    Ok(())
}
