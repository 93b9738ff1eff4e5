use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use bookshelf::airtable::AirtableClient;
use bookshelf::assets;
use bookshelf::config;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Download every record's cover image into the images directory, skipping files already present"
)]
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
    let client = AirtableClient::new(cfg.airtable.base_id.clone(), token)?;

    println!("Starting image download...\n");
    let report = assets::download_covers(
        &client,
        &client,
        &cfg.assets.table,
        &cfg.fields,
        Path::new(&cfg.assets.images_dir),
    )
    .await?;

    println!("\n📊 Summary:");
    println!("{}", report);
    println!("\n✓ Image download complete!");
    if report.downloaded > 0 {
        println!("\nNext step: run `bookshelf` to rebuild the pages.");
    }
    Ok(())
}
