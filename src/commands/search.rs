//! Search command handler: filter topics and print answers side by side.

use anyhow::Result;
use biogen_core::config::FileConfig;
use biogen_core::index::ViewerIndex;
use tracing::debug;

use super::{apply_index_flags, print_json};
use crate::cli::SearchArgs;

pub fn run_search_command(args: &SearchArgs, config: &FileConfig) -> Result<()> {
    let options = apply_index_flags(config.index_options(), &args.index);
    let index = ViewerIndex::load(&options);

    let query = args.query.join(" ");
    let response = index.search(&query, args.systems.as_deref());
    debug!(query = %query, results = response.count, "Search complete");
    print_json(&response)
}
