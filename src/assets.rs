//! Cover image downloader. Images are keyed by a sanitised title; an existing
//! file with that name counts as already downloaded.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;
use tracing::{error, info, instrument, warn};

use crate::airtable::{ImageSource, RecordSource};
use crate::config::Fields;
use crate::site::write_atomic;

pub const MAX_STEM_LEN: usize = 100;
pub const DEFAULT_EXTENSION: &str = ".jpg";

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new("[^a-z0-9]+").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl fmt::Display for AssetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   Downloaded: {}", self.downloaded)?;
        writeln!(f, "   Skipped: {}", self.skipped)?;
        write!(f, "   Errors: {}", self.errors)
    }
}

/// Lowercase, collapse every run of non `[a-z0-9]` into one `-`, trim dashes,
/// cut to [`MAX_STEM_LEN`] characters.
pub fn sanitize_filename(title: &str) -> String {
    let lower = title.to_lowercase();
    let dashed = NON_ALNUM.replace_all(&lower, "-");
    dashed.trim_matches('-').chars().take(MAX_STEM_LEN).collect()
}

/// Extension (with dot) of the attachment's original file name, or `.jpg`.
pub fn extension_for(original: Option<&str>) -> String {
    original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Download the first cover image of every record in `table` into `images_dir`.
///
/// Listing the records is fatal; a failed image is counted and skipped.
#[instrument(skip_all, fields(table = %table))]
pub async fn download_covers(
    source: &dyn RecordSource,
    images: &dyn ImageSource,
    table: &str,
    fields: &Fields,
    images_dir: &Path,
) -> Result<AssetReport> {
    tokio::fs::create_dir_all(images_dir)
        .await
        .with_context(|| format!("failed to create {}", images_dir.display()))?;

    let records = source
        .fetch_all(table, None)
        .await
        .context("failed to fetch records")?;
    println!("Found {} total records in Airtable\n", records.len());

    let mut report = AssetReport::default();
    for record in &records {
        let Some(title) = record.text(&fields.title) else {
            println!("⚠️  Skipping record with no title");
            report.skipped += 1;
            continue;
        };

        let cover = record.first_attachment(&fields.cover);
        let Some(url) = cover.as_ref().and_then(|c| c.url()) else {
            println!("⚠️  No image for: {}", title);
            report.skipped += 1;
            continue;
        };

        let stem = sanitize_filename(title);
        if stem.is_empty() {
            warn!(title, "title has no usable characters for a file name");
            report.skipped += 1;
            continue;
        }
        let filename = format!(
            "{}{}",
            stem,
            extension_for(cover.as_ref().and_then(|c| c.filename()))
        );
        let path = images_dir.join(&filename);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            println!("✓ Already exists: {}", filename);
            report.skipped += 1;
            continue;
        }

        let saved = match images.download(url).await {
            Ok(bytes) => write_atomic(&path, &bytes).await,
            Err(err) => Err(err),
        };
        match saved {
            Ok(()) => {
                info!(%filename, "image saved");
                println!("✓ Downloaded: {}", filename);
                report.downloaded += 1;
            }
            Err(err) => {
                error!(?err, title, url, "image download failed");
                eprintln!("✗ Failed to download {}: {:#}", title, err);
                report.errors += 1;
            }
        }
    }

    Ok(report)
}
