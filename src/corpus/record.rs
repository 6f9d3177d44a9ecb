//! Typed view over raw corpus records.
//!
//! Upstream systems have emitted at least three answer layouts over time. A
//! record is classified into exactly one [`AnswerShape`] by a fixed
//! precedence, so the normalizer matches exhaustively instead of probing
//! optional fields.

use serde_json::Value;

use super::extractor::{identifier_from_value, integral_number_text, pmid_field};

/// One entry of a structured `responses` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEntry {
    /// Raw sentence text (untrimmed; empty when the entry carried no string text).
    pub text: String,
    /// Validated, deduplicated identifiers from the entry's own `citations`.
    pub citations: Vec<String>,
}

/// The answer layout of one record, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerShape {
    /// Non-empty `responses[]` list with per-sentence citations.
    Responses(Vec<ResponseEntry>),
    /// Flat `answer` string.
    Answer(String),
    /// Flat `text` string.
    Text(String),
    /// None of the known answer fields are present.
    Empty,
}

impl AnswerShape {
    /// Classifies a record. `responses` wins over `answer`, which wins over `text`.
    #[must_use]
    pub fn classify(record: &Value) -> Self {
        if let Some(responses) = record.get("responses").and_then(Value::as_array)
            && !responses.is_empty()
        {
            return Self::Responses(responses.iter().map(response_entry).collect());
        }
        if let Some(Value::String(answer)) = record.get("answer") {
            return Self::Answer(answer.clone());
        }
        if let Some(Value::String(text)) = record.get("text") {
            return Self::Text(text.clone());
        }
        Self::Empty
    }
}

/// A raw record reduced to the parts the normalizer consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Resolved topic identifier, if any candidate field held one.
    pub topic_id: Option<u64>,
    /// Answer layout.
    pub shape: AnswerShape,
}

impl RawRecord {
    /// Builds the typed view of a parsed JSON record.
    #[must_use]
    pub fn from_value(record: &Value) -> Self {
        Self {
            topic_id: resolve_topic_id(record),
            shape: AnswerShape::classify(record),
        }
    }
}

/// Resolves the topic identifier: `metadata.topic_id`, `topic_id`, `qid`, then `id`.
///
/// A candidate counts only if its trimmed string form is all decimal digits
/// (and fits in a `u64`); otherwise the next candidate is tried.
#[must_use]
pub fn resolve_topic_id(record: &Value) -> Option<u64> {
    let candidates = [
        record.get("metadata").and_then(|md| md.get("topic_id")),
        record.get("topic_id"),
        record.get("qid"),
        record.get("id"),
    ];
    candidates.into_iter().flatten().find_map(parse_topic_id)
}

/// Parses a topic identifier from a JSON string or non-negative integral number.
#[must_use]
pub fn parse_topic_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => integral_number_text(n)?.parse().ok(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            trimmed.parse().ok()
        }
        _ => None,
    }
}

fn response_entry(value: &Value) -> ResponseEntry {
    let text = value
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut citations: Vec<String> = Vec::new();
    let entries = value
        .get("citations")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    for entry in entries {
        let candidate = if entry.is_object() {
            identifier_from_value(pmid_field(entry))
        } else {
            identifier_from_value(entry)
        };
        if let Some(id) = candidate
            && !citations.contains(&id)
        {
            citations.push(id);
        }
    }

    ResponseEntry { text, citations }
}
