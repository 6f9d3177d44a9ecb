//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use biogen_core::corpus::DuplicatePolicy;
use biogen_core::lookup::{DEFAULT_RETMAX, MAX_RETMAX};
use biogen_core::topics::EmptyQueryPolicy;
use clap::{Parser, Subcommand};

/// Compare QA-system answers over a benchmark topic set.
///
/// Loads the topic catalog and every system's answer file from a data
/// directory, then searches topics, lists systems, looks up supporting
/// literature, or serves the same data as a JSON API.
#[derive(Parser, Debug)]
#[command(name = "biogen-viewer")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/biogen-viewer/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding task_b.json and the system answer files
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search topics and show every selected system's answer
    Search(SearchArgs),

    /// List systems and their descriptions
    Systems,

    /// Find PubMed citations for a sentence
    Cite(CiteArgs),

    /// Fetch PubMed article details
    Pubmed(PubmedArgs),

    /// Serve the JSON API
    Serve(ServeArgs),
}

/// Overrides for how the index is built.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct IndexFlags {
    /// Result for an empty query: all | none
    #[arg(long, value_name = "POLICY")]
    pub empty_query: Option<EmptyQueryPolicy>,

    /// Handling of repeated topic ids in one system file: replace | concatenate
    #[arg(long, value_name = "POLICY")]
    pub duplicates: Option<DuplicatePolicy>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Query tokens (all must match); empty lists every topic by default
    pub query: Vec<String>,

    /// Comma-separated system names (unknown names are ignored)
    #[arg(long, value_name = "NAMES")]
    pub systems: Option<String>,

    #[command(flatten)]
    pub index: IndexFlags,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CiteArgs {
    /// Sentence to find citations for
    pub sentence: Vec<String>,

    /// Maximum citations to return (1-20)
    #[arg(long, default_value_t = DEFAULT_RETMAX as u8, value_parser = clap::value_parser!(u8).range(1..=MAX_RETMAX as i64))]
    pub retmax: u8,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PubmedArgs {
    /// PubMed identifiers, separated by spaces or commas
    pub pmids: Vec<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address (defaults to 127.0.0.1:3000)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    #[command(flatten)]
    pub index: IndexFlags,
}
