//! Human-readable descriptions of the compared systems.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

/// Built-in descriptions for the default systems.
pub const DEFAULT_DESCRIPTIONS: [(&str, &str); 5] = [
    ("System A", "Baseline + Qwen (placeholder)."),
    ("System B", "Placeholder."),
    (
        "System C",
        "BM25 + reformulations; MedCPT bi-encoder + cross-encoder rerank.",
    ),
    (
        "System D",
        "BM25 original; keep top-30 after rerank; MedCPT bi+cross encoder.",
    ),
    ("System E", "Placeholder."),
];

/// Returns the built-in descriptions.
#[must_use]
pub fn default_descriptions() -> BTreeMap<String, String> {
    DEFAULT_DESCRIPTIONS
        .iter()
        .map(|(name, desc)| ((*name).to_string(), (*desc).to_string()))
        .collect()
}

/// Merges a JSON object of `name -> description` over the defaults.
///
/// Malformed JSON or a non-object document leaves the defaults untouched.
/// Non-string values are ignored.
#[must_use]
pub fn merge_descriptions(content: &str) -> BTreeMap<String, String> {
    let mut descriptions = default_descriptions();
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(overrides)) => {
            for (name, value) in overrides {
                match value {
                    Value::String(desc) => {
                        descriptions.insert(name, desc);
                    }
                    other => debug!(system = %name, value = %other, "Ignoring non-string description"),
                }
            }
        }
        Ok(_) => warn!("System descriptions file is not a JSON object; using defaults"),
        Err(error) => warn!(error = %error, "System descriptions file is not valid JSON; using defaults"),
    }
    descriptions
}

/// Loads descriptions from an optional file; a missing file yields the defaults.
#[must_use]
pub fn load_descriptions_file(path: &Path) -> BTreeMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(content) => merge_descriptions(&content),
        Err(error) => {
            debug!(path = %path.display(), error = %error, "No system descriptions file; using defaults");
            default_descriptions()
        }
    }
}
