//! CLI entry point for the answer comparison viewer.

use anyhow::Result;
use biogen_core::config::{EnvOverrides, load_config};
use clap::Parser;
use tracing::{debug, info};

mod cli;
mod commands;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries JSON output only.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = load_config(args.config.as_deref())?;
    if loaded.loaded_from_file
        && let Some(path) = &loaded.path
    {
        info!(path = %path.display(), "Loaded config file");
    }
    let mut config = loaded.config.unwrap_or_default();
    config.apply_env(&EnvOverrides::from_env());
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = Some(data_dir.clone());
    }

    match &args.command {
        Command::Search(search) => commands::run_search_command(search, &config),
        Command::Systems => commands::run_systems_command(&config),
        Command::Cite(cite) => commands::run_cite_command(cite, &config).await,
        Command::Pubmed(pubmed) => commands::run_pubmed_command(pubmed, &config).await,
        Command::Serve(serve) => commands::run_serve_command(serve, &config).await,
    }
}
