//! Search-term construction and small field extractors for E-utilities results.

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::{collapse_whitespace, compile_static_regex};

/// Sentences at or below this length also match as an exact title/abstract phrase.
pub const PHRASE_QUERY_MAX_CHARS: usize = 160;
/// Maximum content tokens in the AND clause.
pub const MAX_QUERY_TOKENS: usize = 14;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "then", "else", "when", "while", "for", "to", "of",
    "in", "on", "by", "with", "is", "are", "was", "were", "be", "been", "being", "this", "that",
    "these", "those", "it", "its", "as", "at", "from", "we", "you", "they", "he", "she", "them",
    "his", "her", "their", "our", "my", "your", "not", "no", "yes", "do", "does", "did", "done",
    "than", "such",
];

static DOI_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)\b10\.\d{4,9}/[-._;()/:A-Z0-9]+"));

/// Collapses whitespace in a free-text sentence.
#[must_use]
pub fn sanitize_sentence(sentence: &str) -> String {
    collapse_whitespace(sentence)
}

/// Lower-cased content tokens of `sentence`: letters, digits, and hyphens only,
/// minus stop words and tokens of two characters or fewer.
#[must_use]
pub fn content_tokens(sentence: &str) -> Vec<String> {
    let cleaned: String = sentence
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > 2 && !STOP_WORDS.contains(token))
        .take(MAX_QUERY_TOKENS)
        .map(str::to_string)
        .collect()
}

/// Builds a `PubMed` search term for a sentence.
///
/// Short sentences search for the exact phrase or all content words; long ones
/// use only the content words. A sentence with no content words falls back to
/// the phrase.
#[must_use]
pub fn build_query(sentence: &str) -> String {
    let sentence = sanitize_sentence(sentence);
    let quoted = format!("\"{sentence}\"[tiab]");
    let and_query = content_tokens(&sentence)
        .iter()
        .map(|token| format!("{token}[tiab]"))
        .collect::<Vec<_>>()
        .join(" AND ");

    if and_query.is_empty() {
        return quoted;
    }
    if sentence.chars().count() <= PHRASE_QUERY_MAX_CHARS {
        return format!("({quoted}) OR ({and_query})");
    }
    and_query
}

/// Returns the first DOI found in an `elocationid` value, or an empty string.
#[must_use]
pub fn extract_doi(elocation: &str) -> String {
    DOI_RE
        .find(elocation)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
