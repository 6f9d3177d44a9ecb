use anyhow::Result;
use biogen_core::config::FileConfig;
use biogen_core::lookup::{BibliographicLookup, PubMedClient, require_pmids};

use super::{print_json, print_lookup_failure};
use crate::cli::PubmedArgs;

pub async fn run_pubmed_command(args: &PubmedArgs, config: &FileConfig) -> Result<()> {
    let joined = args.pmids.join(",");
    let pmids = require_pmids(Some(joined.as_str()))?;
    let client = PubMedClient::new(config.lookup_settings())?;

    match client.fetch_articles(&pmids).await {
        Ok(response) => print_json(&response),
        Err(error) => print_lookup_failure(&error),
    }
}
