use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use bookshelf::airtable::AirtableClient;
use bookshelf::config;
use bookshelf::fallback::{
    build_nav, CredentialStore, FallbackError, FallbackRenderer, LocalStorage, NavLink, View,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Render one gallery live with a personal access token, the way the in-browser fallback does"
)]
struct Args {
    /// Path to YAML config file (built-in defaults are used if it does not exist)
    #[arg(long, default_value = "bookshelf.yaml")]
    config: PathBuf,

    /// Output file name of the page to preview (defaults to the first configured page)
    #[arg(long)]
    page: Option<String>,

    /// JSON file standing in for browser local storage
    #[arg(long, default_value = ".bookshelf/local_storage.json")]
    storage: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = config::load_or_default(&args.config)?;
    let page = match &args.page {
        Some(file) => cfg
            .page(file)
            .ok_or_else(|| anyhow!("no page '{}' in config", file))?,
        None => cfg
            .pages
            .first()
            .ok_or_else(|| anyhow!("config lists no pages"))?,
    };

    let mut renderer =
        FallbackRenderer::for_page(LocalStorage::new(&args.storage), page, cfg.fields.clone());
    if let Some(View::SetupPrompt { notice }) = renderer.initial_view() {
        prompt_for_token(&mut renderer, notice.as_deref())?;
    }

    let gallery = loop {
        let base_id = cfg.airtable.base_id.clone();
        let view = renderer
            .refresh(|token| AirtableClient::new(base_id, token.to_string()))
            .await;
        match view {
            View::Gallery(gallery) => break gallery,
            View::SetupPrompt { notice } => prompt_for_token(&mut renderer, notice.as_deref())?,
            View::Error { message } => bail!("{}", message),
        }
    };

    let nav = build_nav(&NavLink::from_pages(&cfg.pages), &page.file);
    println!("{}", nav.outer_html());
    println!("{}", gallery.outer_html());
    Ok(())
}

fn prompt_for_token<S: CredentialStore>(
    renderer: &mut FallbackRenderer<S>,
    notice: Option<&str>,
) -> Result<()> {
    if let Some(notice) = notice {
        eprintln!("✗ {}", notice);
    }
    eprintln!("First time setup: enter your Airtable Personal Access Token.");
    eprintln!("It is stored in plain text in the local storage file only.");

    let stdin = std::io::stdin();
    loop {
        eprint!("Token: ");
        std::io::stderr().flush().ok();
        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("failed to read token from stdin")?;
        if read == 0 {
            bail!("no token provided");
        }
        match renderer.save_token(&line) {
            Ok(()) => return Ok(()),
            Err(FallbackError::EmptyToken) => eprintln!("{}", FallbackError::EmptyToken),
            Err(err) => bail!("{}", err),
        }
    }
}
