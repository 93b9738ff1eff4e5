//! Configuration loader and validator for the bookshelf site generator.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Missing {0}. Set it locally or in your CI secrets.")]
    MissingToken(String),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub airtable: Airtable,
    pub site: Site,
    pub assets: Assets,
    #[serde(default)]
    pub fields: Fields,
    pub pages: Vec<PageDescriptor>,
}

/// Airtable base and credential lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Airtable {
    pub base_id: String,
    /// Name of the environment variable holding the personal access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

/// Output settings for the generated pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub output_dir: String,
    /// Optional HTML partial inserted at the top of every page.
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default = "default_stylesheet")]
    pub stylesheet: String,
    /// Render a navigation bar built from `pages`.
    #[serde(default)]
    pub nav: bool,
    /// Follow pagination cursors instead of rendering the first page of a view only.
    #[serde(default)]
    pub paginate: bool,
}

/// Settings for the cover image downloader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assets {
    pub table: String,
    pub images_dir: String,
}

/// Airtable field names read from each record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Fields {
    pub title: String,
    pub notes: String,
    pub cover: String,
    pub link_url: String,
    pub link_text: String,
}

impl Default for Fields {
    fn default() -> Self {
        Self {
            title: "Title author".into(),
            notes: "Notes".into(),
            cover: "Cover image".into(),
            link_url: "Link URL".into(),
            link_text: "Link text".into(),
        }
    }
}

/// One generated HTML document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageDescriptor {
    pub file: String,
    pub table: String,
    pub view: String,
    pub title: String,
    pub heading: String,
    #[serde(default)]
    pub is_list: bool,
    /// Navigation label; falls back to `heading`.
    #[serde(default)]
    pub nav_label: Option<String>,
}

impl PageDescriptor {
    pub fn label(&self) -> &str {
        self.nav_label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.heading)
    }
}

fn default_token_env() -> String {
    "AIRTABLE_TOKEN".into()
}

fn default_stylesheet() -> String {
    "styles.css".into()
}

impl Config {
    /// Ensure output directories exist (creates `site.output_dir` and `assets.images_dir`).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        fs::create_dir_all(&self.site.output_dir)?;
        fs::create_dir_all(&self.assets.images_dir)
    }

    /// Read the access token from the configured environment variable.
    pub fn token(&self) -> Result<String, ConfigError> {
        self.token_from(|name| std::env::var(name).ok())
    }

    pub fn token_from<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(&self.airtable.token_env)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingToken(self.airtable.token_env.clone()))
    }

    /// Read the configured header partial, if any.
    pub fn read_header(&self) -> Result<String, ConfigError> {
        match &self.site.header {
            Some(path) if !path.trim().is_empty() => Ok(fs::read_to_string(path)?),
            _ => Ok(String::new()),
        }
    }

    pub fn page(&self, file: &str) -> Option<&PageDescriptor> {
        self.pages.iter().find(|p| p.file == file)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `bookshelf.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("bookshelf.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Like [`load`], but falls back to [`example`] when the file does not exist.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return load(Some(path));
    }
    let cfg: Config = serde_yaml::from_str(example())?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.airtable.base_id.trim().is_empty() {
        return Err(ConfigError::Invalid("airtable.base_id must be non-empty"));
    }
    if cfg.airtable.token_env.trim().is_empty() {
        return Err(ConfigError::Invalid("airtable.token_env must be non-empty"));
    }
    if cfg.site.output_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("site.output_dir must be non-empty"));
    }
    if cfg.assets.table.trim().is_empty() {
        return Err(ConfigError::Invalid("assets.table must be non-empty"));
    }
    if cfg.assets.images_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("assets.images_dir must be non-empty"));
    }

    let f = &cfg.fields;
    for name in [&f.title, &f.notes, &f.cover, &f.link_url, &f.link_text] {
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid("fields.* must be non-empty"));
        }
    }

    if cfg.pages.is_empty() {
        return Err(ConfigError::Invalid("pages must list at least one page"));
    }
    let mut seen = HashSet::new();
    for page in &cfg.pages {
        if page.file.trim().is_empty() {
            return Err(ConfigError::Invalid("pages[].file must be non-empty"));
        }
        if page.file.contains('/') || page.file.contains('\\') {
            return Err(ConfigError::Invalid("pages[].file must be a bare file name"));
        }
        if page.table.trim().is_empty() {
            return Err(ConfigError::Invalid("pages[].table must be non-empty"));
        }
        if page.view.trim().is_empty() {
            return Err(ConfigError::Invalid("pages[].view must be non-empty"));
        }
        if !seen.insert(page.file.as_str()) {
            return Err(ConfigError::Invalid("pages[].file must be unique"));
        }
    }

    Ok(())
}

/// Default configuration, used when no config file is present.
pub fn example() -> &'static str {
    r#"airtable:
  base_id: "app12LraPjbTp4fHG"
  token_env: "AIRTABLE_TOKEN"

site:
  output_dir: "."
  header: "partials/header.html"
  stylesheet: "styles.css"
  nav: false

assets:
  table: "Books read"
  images_dir: "images"

fields:
  title: "Title author"
  notes: "Notes"
  cover: "Cover image"
  link_url: "Link URL"
  link_text: "Link text"

pages:
  - file: "2025.html"
    table: "Books read"
    view: "2025"
    title: "Rachel's Library — 2025"
    heading: "Books I read in 2025"
    nav_label: "2025"
  - file: "2024.html"
    table: "Books read"
    view: "2024"
    title: "Rachel's Library — 2024"
    heading: "Books I read in 2024"
    nav_label: "2024"
  - file: "library.html"
    table: "Books read"
    view: "Library"
    title: "Rachel's Library — Library"
    heading: "Library"
    is_list: true
  - file: "anti-library.html"
    table: "Books read"
    view: "Anti-Library"
    title: "Rachel's Library — Anti-Library"
    heading: "Anti-Library"
    is_list: true
"#
}
