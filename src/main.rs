use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use bookshelf::airtable::AirtableClient;
use bookshelf::config;
use bookshelf::site;

#[derive(Debug, Parser)]
#[command(author, version, about = "Generate the static gallery pages from Airtable")]
struct Args {
    /// Path to YAML config file (built-in defaults are used if it does not exist)
    #[arg(long, default_value = "bookshelf.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load_or_default(&args.config)?;
    cfg.ensure_dirs().context("failed to create output directories")?;
    let token = cfg.token()?;
    let header = cfg.read_header().context("failed to read header partial")?;

    let client = AirtableClient::new(cfg.airtable.base_id.clone(), token)?;

    println!("Starting build...");
    let built = site::build_site(&cfg, &client, &header).await?;
    info!(pages = built.len(), "build finished");
    println!("Build complete!");
    Ok(())
}
