//! Answer normalization: raw record → canonical per-topic answer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::extractor::{IdentifierSet, extract_identifiers};
use super::record::{AnswerShape, RawRecord, ResponseEntry};

/// Maximum identifiers attached to a single sentence.
pub const MAX_SENTENCE_IDENTIFIERS: usize = 3;
/// Maximum identifiers kept in an answer's union list.
pub const MAX_ANSWER_IDENTIFIERS: usize = 50;
/// Separator used when duplicate topic answers are concatenated.
pub const CONCATENATION_SEPARATOR: &str = "\n• ";

/// One answer sentence and the identifiers that support it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub identifiers: Vec<String>,
}

impl Sentence {
    /// Creates a sentence without identifiers.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            identifiers: Vec::new(),
        }
    }
}

/// Canonical answer of one system for one topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAnswer {
    /// Full answer text.
    pub text: String,
    /// Sentence segmentation with per-sentence identifiers.
    pub sentences: Vec<Sentence>,
    /// Deduplicated union of sentence identifiers, first-seen order, at most 50.
    pub identifiers_all: Vec<String>,
}

impl NormalizedAnswer {
    /// Builds an answer from its text and sentences, deriving `identifiers_all`.
    #[must_use]
    pub fn new(text: String, sentences: Vec<Sentence>) -> Self {
        let identifiers_all = union_identifiers(&sentences);
        Self {
            text,
            sentences,
            identifiers_all,
        }
    }

    /// Returns true when the answer has neither text nor sentences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.sentences.is_empty()
    }

    /// Appends `other` using the legacy bullet-separated concatenation.
    #[must_use]
    pub fn concatenate(mut self, other: Self) -> Self {
        if self.text.is_empty() {
            self.text = other.text;
        } else if !other.text.is_empty() {
            self.text = format!("{}{CONCATENATION_SEPARATOR}{}", self.text, other.text);
        }
        self.sentences.extend(other.sentences);
        Self::new(self.text, self.sentences)
    }
}

/// Normalizes one parsed record.
///
/// Returns `None` when no topic identifier can be resolved.
#[must_use]
pub fn normalize(record: &Value) -> Option<(u64, NormalizedAnswer)> {
    let raw = RawRecord::from_value(record);
    let topic_id = raw.topic_id?;
    Some((topic_id, normalize_shape(raw.shape)))
}

/// Outcome of reading one corpus line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A record with a resolved topic.
    Record {
        topic_id: u64,
        answer: NormalizedAnswer,
        /// Whole-record identifiers from [`extract_identifiers`].
        identifiers: Vec<String>,
    },
    /// Valid JSON without a resolvable topic identifier.
    NoTopicId,
    /// Not valid JSON; carries the parser message.
    Malformed(String),
}

/// Parses one corpus line into its answer and record-level identifiers.
#[must_use]
pub fn parse_line(line: &str) -> ParsedLine {
    let record = match serde_json::from_str::<Value>(line) {
        Ok(record) => record,
        Err(error) => return ParsedLine::Malformed(error.to_string()),
    };
    match normalize(&record) {
        Some((topic_id, answer)) => ParsedLine::Record {
            topic_id,
            answer,
            identifiers: extract_identifiers(&record),
        },
        None => ParsedLine::NoTopicId,
    }
}

/// Parses and normalizes one corpus line. Malformed JSON yields `None`.
#[must_use]
pub fn parse_record_line(line: &str) -> Option<(u64, NormalizedAnswer)> {
    match parse_line(line) {
        ParsedLine::Record {
            topic_id, answer, ..
        } => Some((topic_id, answer)),
        ParsedLine::NoTopicId => None,
        ParsedLine::Malformed(error) => {
            debug!(error = %error, "Skipping malformed corpus line");
            None
        }
    }
}

/// Converts a classified answer layout into the canonical answer.
#[must_use]
pub fn normalize_shape(shape: AnswerShape) -> NormalizedAnswer {
    match shape {
        AnswerShape::Responses(entries) => from_responses(entries),
        AnswerShape::Answer(text) | AnswerShape::Text(text) => from_flat_text(&text),
        AnswerShape::Empty => NormalizedAnswer::default(),
    }
}

fn from_responses(entries: Vec<ResponseEntry>) -> NormalizedAnswer {
    let sentences: Vec<Sentence> = entries
        .into_iter()
        .filter_map(|entry| {
            let text = entry.text.trim();
            if text.is_empty() {
                return None;
            }
            let mut identifiers = entry.citations;
            identifiers.truncate(MAX_SENTENCE_IDENTIFIERS);
            Some(Sentence {
                text: text.to_string(),
                identifiers,
            })
        })
        .collect();

    let text = sentences
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    NormalizedAnswer::new(text, sentences)
}

fn from_flat_text(text: &str) -> NormalizedAnswer {
    let text = text.trim();
    let sentences = split_sentences(text)
        .into_iter()
        .map(Sentence::plain)
        .collect();
    NormalizedAnswer::new(text.to_string(), sentences)
}

/// Splits flat text into sentences.
///
/// A boundary sits after `.`, `!` or `?` when it is followed by whitespace and
/// then an uppercase letter or a digit. Pieces are trimmed; empty pieces are
/// dropped.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (_, ch) = chars[i];
        if matches!(ch, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && chars[j].1.is_whitespace() {
                j += 1;
            }
            if j > i + 1
                && j < chars.len()
                && (chars[j].1.is_uppercase() || chars[j].1.is_ascii_digit())
            {
                let end = chars[i + 1].0;
                push_trimmed(&mut sentences, &text[start..end]);
                start = chars[j].0;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}

fn union_identifiers(sentences: &[Sentence]) -> Vec<String> {
    let mut ids = IdentifierSet::new();
    for id in sentences.iter().flat_map(|s| s.identifiers.iter()) {
        if ids.len() >= MAX_ANSWER_IDENTIFIERS {
            break;
        }
        ids.insert(id.clone());
    }
    ids.into_vec()
}
