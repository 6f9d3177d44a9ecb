//! Bibliographic identifier (PMID) extraction from raw corpus records.
//!
//! Identifiers are pulled from the structured citation fields that have shown
//! up across upstream schema generations, plus `PMID: 12345678` mentions in
//! free text. Nothing here fails: a field that is missing or has the wrong
//! shape simply contributes no identifiers.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};

use crate::utils::compile_static_regex;

/// Minimum number of digits in a valid identifier.
pub const MIN_IDENTIFIER_DIGITS: usize = 5;
/// Maximum number of digits in a valid identifier.
pub const MAX_IDENTIFIER_DIGITS: usize = 9;

static PMID_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)PMID[:\s]*([0-9]{5,9})"));

/// Returns true if `value`, after trimming, is 5 to 9 ASCII digits.
#[must_use]
pub fn is_valid_identifier(value: &str) -> bool {
    let trimmed = value.trim();
    (MIN_IDENTIFIER_DIGITS..=MAX_IDENTIFIER_DIGITS).contains(&trimmed.len())
        && trimmed.bytes().all(|b| b.is_ascii_digit())
}

/// Converts a scalar JSON value into a validated identifier.
///
/// Strings are trimmed; numbers with no fractional part are rendered in
/// decimal. Everything else (objects, arrays, booleans, null) is rejected.
#[must_use]
pub fn identifier_from_value(value: &Value) -> Option<String> {
    let candidate = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => integral_number_text(n)?,
        _ => return None,
    };
    is_valid_identifier(&candidate).then_some(candidate)
}

/// Decimal text of an integral JSON number; `12345.0` renders as `12345`.
///
/// Fractional and non-finite numbers yield `None`. Negative values keep their
/// sign, so digit-only checks still reject them.
pub(crate) fn integral_number_text(n: &Number) -> Option<String> {
    if let Some(value) = n.as_u64() {
        return Some(value.to_string());
    }
    let value = n.as_f64()?;
    (value.is_finite() && value.fract() == 0.0).then(|| format!("{value}"))
}

/// First-seen ordered identifier set.
#[derive(Debug, Default)]
pub(crate) struct IdentifierSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl IdentifierSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts `id` if unseen. Returns true when the set grew.
    pub(crate) fn insert(&mut self, id: String) -> bool {
        if self.seen.contains(&id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.ordered.push(id);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

/// Extracts every valid identifier referenced by a raw record.
///
/// Structured fields are scanned first (`pmids`, `metadata.pmids`,
/// `citations[].pmid|PMID`, `references[]`, `evidence[].pmid|PMID`), then free
/// text (`answer`, `text`, `responses[].text`). The result has no duplicates
/// and keeps first-seen order.
#[must_use]
pub fn extract_identifiers(record: &Value) -> Vec<String> {
    let mut ids = IdentifierSet::new();
    let Some(obj) = record.as_object() else {
        return Vec::new();
    };

    for value in array_field(obj.get("pmids")) {
        push_value(&mut ids, value);
    }
    if let Some(metadata) = obj.get("metadata") {
        for value in array_field(metadata.get("pmids")) {
            push_value(&mut ids, value);
        }
    }
    for citation in array_field(obj.get("citations")) {
        push_value(&mut ids, pmid_field(citation));
    }
    for reference in array_field(obj.get("references")) {
        // References are either `{pmid}` objects or bare identifiers.
        match reference.get("pmid") {
            Some(pmid) if is_truthy(pmid) => push_value(&mut ids, pmid),
            _ => push_value(&mut ids, reference),
        }
    }
    for evidence in array_field(obj.get("evidence")) {
        push_value(&mut ids, pmid_field(evidence));
    }

    for key in ["answer", "text"] {
        if let Some(Value::String(text)) = obj.get(key) {
            scan_text(&mut ids, text);
        }
    }
    for response in array_field(obj.get("responses")) {
        if let Some(Value::String(text)) = response.get("text") {
            scan_text(&mut ids, text);
        }
    }

    ids.into_vec()
}

fn scan_text(ids: &mut IdentifierSet, text: &str) {
    for caps in PMID_MENTION_RE.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            ids.insert(m.as_str().to_string());
        }
    }
}

fn push_value(ids: &mut IdentifierSet, value: &Value) {
    if let Some(id) = identifier_from_value(value) {
        ids.insert(id);
    }
}

/// Returns `pmid`, falling back to `PMID`, or `Null` when neither is usable.
pub(crate) fn pmid_field(value: &Value) -> &Value {
    match value.get("pmid") {
        Some(pmid) if is_truthy(pmid) => pmid,
        _ => value.get("PMID").unwrap_or(&Value::Null),
    }
}

fn array_field(value: Option<&Value>) -> &[Value] {
    value.and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
