//! Cite command handler: suggest PubMed citations for one sentence.

use anyhow::Result;
use biogen_core::config::FileConfig;
use biogen_core::lookup::{BibliographicLookup, PubMedClient, require_sentence};

use super::{print_json, print_lookup_failure};
use crate::cli::CiteArgs;

pub async fn run_cite_command(args: &CiteArgs, config: &FileConfig) -> Result<()> {
    let joined = args.sentence.join(" ");
    let sentence = require_sentence(Some(joined.as_str()))?;
    let client = PubMedClient::new(config.lookup_settings())?;

    match client.cite(sentence, usize::from(args.retmax)).await {
        Ok(response) => print_json(&response),
        Err(error) => print_lookup_failure(&error),
    }
}
