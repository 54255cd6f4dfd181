//! Line-delimited question records.
//!
//! A source holds one JSON object per line; blank lines are skipped.

use quiz_core::model::{Question, QuestionBody, QuestionType, SourceId, UnitName};
use serde::Deserialize;

use crate::source::SourceError;

/// Raw shape of one line before validation.
///
/// This mirrors the domain `Question` so the loader can reject records whose
/// fields do not match their declared `type`.
#[derive(Debug, Deserialize)]
struct QuestionRecord {
    #[serde(default)]
    unit: Option<String>,
    stem: String,
    #[serde(flatten)]
    body: RecordBody,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecordBody {
    Mcq {
        choices: Vec<String>,
        answer: usize,
    },
    Open {
        #[serde(default)]
        key_points: Vec<String>,
    },
    Chain {
        steps: Vec<String>,
        correct_order: Vec<usize>,
    },
}

impl RecordBody {
    fn kind(&self) -> QuestionType {
        match self {
            RecordBody::Mcq { .. } => QuestionType::Mcq,
            RecordBody::Open { .. } => QuestionType::Open,
            RecordBody::Chain { .. } => QuestionType::Chain,
        }
    }

    fn into_body(self) -> QuestionBody {
        match self {
            RecordBody::Mcq { choices, answer } => QuestionBody::Mcq { choices, answer },
            RecordBody::Open { key_points } => QuestionBody::Open { key_points },
            RecordBody::Chain {
                steps,
                correct_order,
            } => QuestionBody::Chain {
                steps,
                correct_order,
            },
        }
    }
}

/// Parse a per-unit source; every record is assigned to `unit`.
///
/// Any `unit` field carried by a record is ignored.
///
/// # Errors
///
/// Returns `SourceError::MalformedRecord` for the first line that is not a
/// valid question. No questions are returned in that case.
pub fn parse_unit_records(
    source_id: &SourceId,
    text: &str,
    unit: &UnitName,
) -> Result<Vec<Question>, SourceError> {
    let mut questions = Vec::new();
    for (line, raw) in non_blank_lines(text) {
        let record = decode(source_id, line, raw)?;
        let question = Question::new(unit.clone(), record.stem, record.body.into_body())
            .map_err(|e| malformed(source_id, line, e))?;
        questions.push(question);
    }
    Ok(questions)
}

/// Parse the shared chain source.
///
/// Each record names its own unit; records without one are dropped.
///
/// # Errors
///
/// Returns `SourceError::MalformedRecord` for invalid lines and for records
/// whose `type` is not `chain`.
pub fn parse_chain_records(source_id: &SourceId, text: &str) -> Result<Vec<Question>, SourceError> {
    let mut questions = Vec::new();
    for (line, raw) in non_blank_lines(text) {
        let record = decode(source_id, line, raw)?;
        let kind = record.body.kind();
        if kind != QuestionType::Chain {
            return Err(malformed(
                source_id,
                line,
                format!("expected a chain record, found {kind}"),
            ));
        }

        let Some(unit) = record.unit.and_then(|raw| UnitName::new(raw).ok()) else {
            tracing::debug!(%source_id, line, "dropping chain record without unit");
            continue;
        };

        let question = Question::new(unit, record.stem, record.body.into_body())
            .map_err(|e| malformed(source_id, line, e))?;
        questions.push(question);
    }
    Ok(questions)
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines()
        .enumerate()
        .map(|(index, raw)| (index + 1, raw.trim()))
        .filter(|(_, raw)| !raw.is_empty())
}

fn decode(source_id: &SourceId, line: usize, raw: &str) -> Result<QuestionRecord, SourceError> {
    serde_json::from_str(raw).map_err(|e| malformed(source_id, line, e))
}

fn malformed(source_id: &SourceId, line: usize, reason: impl ToString) -> SourceError {
    SourceError::MalformedRecord {
        source_id: source_id.clone(),
        line,
        reason: reason.to_string(),
    }
}
