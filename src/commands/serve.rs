//! Serve command handler: build the index once, then answer API requests.

use std::sync::Arc;

use anyhow::Result;
use biogen_core::config::FileConfig;
use biogen_core::index::ViewerIndex;
use biogen_core::lookup::{BibliographicLookup, PubMedClient};
use biogen_core::server::{AppState, serve};

use super::apply_index_flags;
use crate::cli::ServeArgs;

pub async fn run_serve_command(args: &ServeArgs, config: &FileConfig) -> Result<()> {
    let options = apply_index_flags(config.index_options(), &args.index);
    let index = Arc::new(ViewerIndex::load(&options));
    let lookup: Arc<dyn BibliographicLookup> =
        Arc::new(PubMedClient::new(config.lookup_settings())?);

    let bind = args.bind.clone().unwrap_or_else(|| config.bind_addr());
    serve(&bind, AppState::new(index, lookup)).await
}
