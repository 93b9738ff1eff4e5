use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::airtable::model::{Record, RecordPage};

pub mod model;

const AIRTABLE_API_BASE: &str = "https://api.airtable.com/";

/// Non-success response from Airtable or an image host.
#[derive(Debug, Error)]
#[error("request failed with status {status}: {body}")]
pub struct StatusError {
    pub status: StatusCode,
    pub body: String,
}

impl StatusError {
    /// Status of `err` if it (or anything in its chain) is a [`StatusError`].
    pub fn status_of(err: &anyhow::Error) -> Option<StatusCode> {
        err.chain()
            .find_map(|e| e.downcast_ref::<StatusError>())
            .map(|e| e.status)
    }
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one page of `table`, optionally scoped to `view`, starting at `offset`.
    async fn fetch_page(
        &self,
        table: &str,
        view: Option<&str>,
        offset: Option<&str>,
    ) -> Result<RecordPage>;

    /// Follow pagination cursors until the source stops returning one.
    async fn fetch_all(&self, table: &str, view: Option<&str>) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let page = self.fetch_page(table, view, offset.as_deref()).await?;
            records.extend(page.records);
            match page.offset.filter(|o| !o.is_empty()) {
                Some(next) if offset.as_deref() == Some(next.as_str()) => {
                    bail!("airtable returned the same offset twice: {}", next);
                }
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        Ok(records)
    }
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct AirtableClient {
    http: Client,
    base_url: Url,
    base_id: String,
    token: String,
}

impl fmt::Debug for AirtableClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtableClient")
            .field("base_url", &self.base_url)
            .field("base_id", &self.base_id)
            .finish_non_exhaustive()
    }
}

impl AirtableClient {
    pub fn new(base_id: String, token: String) -> Result<Self> {
        let base_url = Url::parse(AIRTABLE_API_BASE).context("invalid default Airtable URL")?;
        Self::with_base_url(base_id, token, base_url)
    }

    pub fn with_base_url(base_id: String, token: String, base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("bookshelf/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            base_id,
            token,
        })
    }

    /// `{base}/v0/{base_id}/{table}?view=..&offset=..` with every part percent-encoded.
    pub fn list_url(&self, table: &str, view: Option<&str>, offset: Option<&str>) -> Result<Url> {
        let mut url = self
            .base_url
            .join("v0/")
            .context("invalid Airtable base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Airtable base URL cannot be a base"))?
            .pop_if_empty()
            .push(&self.base_id)
            .push(table);

        let view = view.filter(|v| !v.is_empty());
        let offset = offset.filter(|o| !o.is_empty());
        if view.is_some() || offset.is_some() {
            {
                let mut query = url.query_pairs_mut();
                if let Some(view) = view {
                    query.append_pair("view", view);
                }
                if let Some(offset) = offset {
                    query.append_pair("offset", offset);
                }
            }
            // Form encoding writes spaces as `+`; a literal `+` is already `%2B`.
            let query = url.query().map(|q| q.replace('+', "%20"));
            url.set_query(query.as_deref());
        }
        Ok(url)
    }

    pub fn build_request(
        &self,
        table: &str,
        view: Option<&str>,
        offset: Option<&str>,
    ) -> Result<reqwest::Request> {
        let url = self.list_url(table, view, offset)?;
        self.http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .build()
            .context("failed to build Airtable request")
    }
}

#[async_trait]
impl RecordSource for AirtableClient {
    async fn fetch_page(
        &self,
        table: &str,
        view: Option<&str>,
        offset: Option<&str>,
    ) -> Result<RecordPage> {
        let request = self.build_request(table, view, offset)?;
        debug!(url = %request.url(), authorization = "Bearer [REDACTED]", "sending airtable request");

        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Airtable")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_else(|_| "<no body>".into());
            warn!(%status, %body, table, ?view, "airtable error response");
            return Err(StatusError { status, body }.into());
        }

        let page: RecordPage = res
            .json()
            .await
            .context("invalid Airtable response JSON")?;
        info!(
            table,
            ?view,
            records = page.records.len(),
            more = page.offset.is_some(),
            "fetched airtable page"
        );
        Ok(page)
    }
}

#[async_trait]
impl ImageSource for AirtableClient {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", url))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(StatusError { status, body }.into());
        }
        let bytes = res
            .bytes()
            .await
            .with_context(|| format!("failed to read image body from {}", url))?;
        Ok(bytes.to_vec())
    }
}
