//! Static page builder: one Airtable view in, one HTML document out.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::airtable::model::Record;
use crate::airtable::RecordSource;
use crate::config::{Config, Fields, PageDescriptor};
use crate::page::{render_page, Layout};
use crate::render::render_cards_html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPage {
    pub file: String,
    pub path: PathBuf,
    pub records: usize,
}

/// Build every configured page in order. The first failure aborts the run;
/// pages already written stay in place.
#[instrument(skip_all, fields(pages = cfg.pages.len()))]
pub async fn build_site(
    cfg: &Config,
    source: &dyn RecordSource,
    header: &str,
) -> Result<Vec<BuiltPage>> {
    let out_dir = Path::new(&cfg.site.output_dir);
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let layout = Layout::from_config(cfg, header);
    let mut built = Vec::with_capacity(cfg.pages.len());
    for page in &cfg.pages {
        println!("Building {} (Airtable view: \"{}\")...", page.file, page.view);
        let records = fetch_records(source, page, cfg.site.paginate)
            .await
            .with_context(|| format!("failed to build {}", page.file))?;

        let html = render_document(page, &layout, &records, &cfg.fields);
        let path = out_dir.join(&page.file);
        write_atomic(&path, html.as_bytes()).await?;

        info!(file = %page.file, records = records.len(), "page written");
        println!("✓ {} generated with {} books", page.file, records.len());
        built.push(BuiltPage {
            file: page.file.clone(),
            path,
            records: records.len(),
        });
    }
    Ok(built)
}

async fn fetch_records(
    source: &dyn RecordSource,
    page: &PageDescriptor,
    paginate: bool,
) -> Result<Vec<Record>> {
    let view = Some(page.view.as_str());
    let records = if paginate {
        source.fetch_all(&page.table, view).await
    } else {
        source
            .fetch_page(&page.table, view, None)
            .await
            .map(|p| p.records)
    };
    records.with_context(|| format!("failed to fetch view \"{}\"", page.view))
}

pub fn render_document(
    page: &PageDescriptor,
    layout: &Layout<'_>,
    records: &[Record],
    fields: &Fields,
) -> String {
    render_page(page, layout, &render_cards_html(records, fields))
}

/// Write to a hidden sibling first so a failed write never leaves a partial file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid output path {}", path.display()))?;
    let tmp = path.with_file_name(format!(".{}.tmp", name));
    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err).with_context(|| format!("failed to move into {}", path.display()));
    }
    Ok(())
}
