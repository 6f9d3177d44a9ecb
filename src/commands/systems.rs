use anyhow::Result;
use biogen_core::config::FileConfig;
use biogen_core::index::ViewerIndex;

use super::print_json;

pub fn run_systems_command(config: &FileConfig) -> Result<()> {
    let index = ViewerIndex::load(&config.index_options());
    print_json(&index.systems_overview())
}
