//! CLI command handlers.

mod cite;
mod pubmed;
mod search;
mod serve;
mod systems;

pub use cite::run_cite_command;
pub use pubmed::run_pubmed_command;
pub use search::run_search_command;
pub use serve::run_serve_command;
pub use systems::run_systems_command;

use anyhow::Result;
use biogen_core::index::IndexOptions;
use biogen_core::lookup::LookupError;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::cli::IndexFlags;

/// Prints `value` to stdout as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the `{"error": ..}` envelope for a failed lookup.
fn print_lookup_failure(error: &LookupError) -> Result<()> {
    warn!(error = %error, "Lookup failed");
    print_json(&json!({ "error": error.summary() }))
}

fn apply_index_flags(mut options: IndexOptions, flags: &IndexFlags) -> IndexOptions {
    if let Some(policy) = flags.empty_query {
        options.empty_query = policy;
    }
    if let Some(policy) = flags.duplicates {
        options.duplicates = policy;
    }
    options
}
