//! Small shared helpers used by the corpus and lookup modules.

use std::sync::LazyLock;

use regex::Regex;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Regex for extracting a 4-digit year (19xx or 20xx) from a string.
pub(crate) static YEAR_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"\b(19|20)\d{2}\b"));

/// Returns the first year-like match (19xx or 20xx) in `value`, or an empty string.
#[must_use]
pub(crate) fn extract_year_from_str(value: &str) -> String {
    YEAR_VALUE_RE
        .find(value)
        .map(|capture| capture.as_str().to_string())
        .unwrap_or_default()
}

/// Collapses whitespace runs to single spaces and trims the ends.
#[must_use]
pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
