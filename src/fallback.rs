//! Live gallery renderer for when the pre-built pages are unavailable.
//!
//! The credential comes from the end user and is kept in a [`CredentialStore`];
//! cards are built as element trees with [`DomRenderer`].

use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

use crate::airtable::model::Record;
use crate::airtable::{RecordSource, StatusError};
use crate::config::{Fields, PageDescriptor};
use crate::dom::Element;
use crate::render::{CardRenderer, DomRenderer};

/// Local-storage key holding the personal access token.
pub const TOKEN_KEY: &str = "airtable_token";
pub const INVALID_TOKEN_NOTICE: &str = "Invalid token. Please try again.";
pub const DEFAULT_TABLE: &str = "Books read";
pub const DEFAULT_VIEW: &str = "All books (pictures)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FallbackError {
    #[error("Please enter a token")]
    EmptyToken,
    #[error("failed to save token: {0}")]
    Storage(String),
}

pub trait CredentialStore {
    fn get(&self) -> Option<String>;
    fn set(&mut self, token: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    token: Option<String>,
}

impl MemoryStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self) -> Option<String> {
        self.token.clone()
    }

    fn set(&mut self, token: &str) -> Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }
}

/// Browser-style key/value storage persisted as a JSON object on disk.
/// The token is stored in plain text under [`TOKEN_KEY`].
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("invalid local storage file {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let raw = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl CredentialStore for LocalStorage {
    fn get(&self) -> Option<String> {
        match self.read_all() {
            Ok(mut items) => items.remove(TOKEN_KEY).filter(|t| !t.is_empty()),
            Err(err) => {
                warn!(?err, "ignoring unreadable local storage");
                None
            }
        }
    }

    fn set(&mut self, token: &str) -> Result<()> {
        let mut items = self.read_all()?;
        items.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_all(&items)
    }

    fn clear(&mut self) -> Result<()> {
        let mut items = self.read_all()?;
        if items.remove(TOKEN_KEY).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

/// What the page should currently show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    SetupPrompt { notice: Option<String> },
    Gallery(Element),
    Error { message: String },
}

impl View {
    pub fn to_element(&self) -> Element {
        match self {
            View::SetupPrompt { notice } => setup_prompt(notice.as_deref()),
            View::Gallery(gallery) => gallery.clone(),
            View::Error { message } => error_panel(message),
        }
    }
}

pub struct FallbackRenderer<S: CredentialStore> {
    store: S,
    table: String,
    view: String,
    fields: Fields,
}

impl<S: CredentialStore> FallbackRenderer<S> {
    pub fn new(store: S, table: &str, view: &str, fields: Fields) -> Self {
        let table = if table.trim().is_empty() { DEFAULT_TABLE } else { table };
        let view = if view.trim().is_empty() { DEFAULT_VIEW } else { view };
        Self {
            store,
            table: table.to_string(),
            view: view.to_string(),
            fields,
        }
    }

    pub fn for_page(store: S, page: &PageDescriptor, fields: Fields) -> Self {
        Self::new(store, &page.table, &page.view, fields)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has_credential(&self) -> bool {
        self.store.get().is_some()
    }

    /// Prompt when no credential is stored; `None` means a fetch can start.
    pub fn initial_view(&self) -> Option<View> {
        (!self.has_credential()).then_some(View::SetupPrompt { notice: None })
    }

    pub fn save_token(&mut self, input: &str) -> Result<(), FallbackError> {
        let token = input.trim();
        if token.is_empty() {
            return Err(FallbackError::EmptyToken);
        }
        self.store
            .set(token)
            .map_err(|err| FallbackError::Storage(format!("{:#}", err)))
    }

    /// Fetch the configured view with the stored credential and render it.
    /// A 401 clears the credential and returns to the setup prompt.
    pub async fn refresh<R, F>(&mut self, connect: F) -> View
    where
        R: RecordSource,
        F: FnOnce(&str) -> Result<R>,
    {
        let Some(token) = self.store.get() else {
            return View::SetupPrompt { notice: None };
        };
        let source = match connect(&token) {
            Ok(source) => source,
            Err(err) => {
                return View::Error {
                    message: format!("{:#}", err),
                }
            }
        };

        match source.fetch_page(&self.table, Some(&self.view), None).await {
            Ok(page) => {
                info!(records = page.records.len(), view = %self.view, "rendering live gallery");
                View::Gallery(self.gallery(&page.records))
            }
            Err(err) => match StatusError::status_of(&err) {
                Some(status) if status == StatusCode::UNAUTHORIZED => {
                    if let Err(err) = self.store.clear() {
                        warn!(?err, "failed to clear rejected token");
                    }
                    View::SetupPrompt {
                        notice: Some(INVALID_TOKEN_NOTICE.to_string()),
                    }
                }
                Some(status) => View::Error {
                    message: format!("Failed to fetch: {}", status.as_u16()),
                },
                None => View::Error {
                    message: format!("{:#}", err),
                },
            },
        }
    }

    pub fn gallery(&self, records: &[Record]) -> Element {
        let mut gallery = Element::new("div")
            .with_attr("id", "gallery")
            .with_class("gallery");
        if records.is_empty() {
            gallery.append_child(Element::new("div").with_class("error").with_text("No books found."));
            return gallery;
        }
        for card in DomRenderer.render_records(records, &self.fields) {
            gallery.append_child(card);
        }
        gallery
    }
}

fn setup_prompt(notice: Option<&str>) -> Element {
    let mut prompt = Element::new("div")
        .with_attr("id", "setupPrompt")
        .with_class("setup-prompt");
    prompt.append_child(Element::new("h2").with_text("First Time Setup"));
    if let Some(notice) = notice {
        prompt.append_child(Element::new("p").with_class("error").with_text(notice));
    }
    prompt.append_child(Element::new("p").with_text(
        "To display your books, please enter your Airtable Personal Access Token. \
         It is saved in this browser only and never shared.",
    ));
    prompt.append_child(
        Element::new("input")
            .with_attr("type", "password")
            .with_attr("id", "tokenInput")
            .with_attr("placeholder", "Enter your Airtable token here"),
    );
    prompt.append_child(
        Element::new("button")
            .with_attr("id", "saveTokenButton")
            .with_text("Save Token"),
    );
    prompt
}

fn error_panel(message: &str) -> Element {
    let mut panel = Element::new("div").with_class("error");
    panel.append_child(Element::new("p").with_text(message));
    panel.append_child(
        Element::new("button")
            .with_attr("id", "retryButton")
            .with_text("Try Again"),
    );
    panel
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub href: String,
    pub label: String,
}

impl NavLink {
    pub fn from_pages(pages: &[PageDescriptor]) -> Vec<NavLink> {
        pages
            .iter()
            .map(|p| NavLink {
                href: p.file.clone(),
                label: p.label().to_string(),
            })
            .collect()
    }
}

/// Navigation bar for the page at `current_path`; an empty last segment is `index.html`.
pub fn build_nav(links: &[NavLink], current_path: &str) -> Element {
    let current = match current_path.rsplit('/').next() {
        Some(last) if !last.is_empty() => last,
        _ => "index.html",
    };

    let mut nav = Element::new("nav").with_class("nav-links");
    for (i, link) in links.iter().enumerate() {
        let mut a = Element::new("a")
            .with_attr("href", &link.href)
            .with_text(&link.label);
        if link.href == current {
            a.add_class("active");
        }
        nav.append_child(a);
        if i + 1 < links.len() {
            nav.append_child(Element::new("span").with_text(" · "));
        }
    }
    nav
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_token_trims_and_rejects_empty() {
        let mut r = FallbackRenderer::new(MemoryStore::default(), "", "", Fields::default());
        assert_eq!(r.initial_view(), Some(View::SetupPrompt { notice: None }));
        assert_eq!(r.save_token("   "), Err(FallbackError::EmptyToken));
        assert!(!r.has_credential());
        r.save_token("  pat.abc \n").unwrap();
        assert_eq!(r.store().get().as_deref(), Some("pat.abc"));
        assert_eq!(r.initial_view(), None);
    }

    #[test]
    fn empty_target_uses_defaults() {
        let r = FallbackRenderer::new(MemoryStore::default(), " ", "", Fields::default());
        assert_eq!(r.table, DEFAULT_TABLE);
        assert_eq!(r.view, DEFAULT_VIEW);
    }

    #[test]
    fn empty_gallery_says_no_books() {
        let r = FallbackRenderer::new(MemoryStore::default(), "T", "V", Fields::default());
        let gallery = r.gallery(&[]);
        assert_eq!(
            gallery.outer_html(),
            "<div id=\"gallery\" class=\"gallery\"><div class=\"error\">No books found.</div></div>"
        );
    }

    #[test]
    fn local_storage_round_trip() {
        let td = tempdir().unwrap();
        let path = td.path().join("state").join("local_storage.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "theme": "dark" }"#).unwrap();

        let mut store = LocalStorage::new(&path);
        assert_eq!(store.get(), None);
        store.set("pat123").unwrap();
        assert_eq!(LocalStorage::new(&path).get().as_deref(), Some("pat123"));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("theme"));
        assert!(!raw.contains(TOKEN_KEY));
    }

    #[test]
    fn local_storage_missing_file_is_empty() {
        let td = tempdir().unwrap();
        let path = td.path().join("nope.json");
        let mut store = LocalStorage::new(&path);
        assert_eq!(store.get(), None);
        store.clear().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn local_storage_corrupt_file_is_not_overwritten() {
        let td = tempdir().unwrap();
        let path = td.path().join("local_storage.json");
        std::fs::write(&path, "{ \"theme\": ").unwrap();

        let mut store = LocalStorage::new(&path);
        assert_eq!(store.get(), None);
        assert!(store.set("pat123").is_err());
        assert!(store.clear().is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ \"theme\": ");
    }

    #[test]
    fn prompt_and_error_views_render() {
        let prompt = View::SetupPrompt {
            notice: Some(INVALID_TOKEN_NOTICE.into()),
        }
        .to_element();
        assert_eq!(prompt.attr("id"), Some("setupPrompt"));
        assert!(prompt.text_content().contains(INVALID_TOKEN_NOTICE));

        let err = View::Error {
            message: "<b>boom</b>".into(),
        }
        .to_element();
        assert!(err.outer_html().contains("&lt;b&gt;boom&lt;/b&gt;"));
    }

    #[test]
    fn nav_marks_current_page() {
        let links = vec![
            NavLink { href: "about.html".into(), label: "About".into() },
            NavLink { href: "index.html".into(), label: "Recs".into() },
            NavLink { href: "2025.html".into(), label: "2025".into() },
        ];

        let nav = build_nav(&links, "/books/2025.html");
        let active: Vec<String> = nav
            .find_by_class("active")
            .iter()
            .map(|a| a.text_content())
            .collect();
        assert_eq!(active, vec!["2025".to_string()]);
        assert_eq!(nav.text_content(), "About · Recs · 2025");

        let root = build_nav(&links, "/books/");
        assert_eq!(root.find_by_class("active")[0].attr("href"), Some("index.html"));
        assert_eq!(build_nav(&links, "").find_by_class("active").len(), 1);
    }
}
