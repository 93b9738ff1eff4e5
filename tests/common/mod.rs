#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bookshelf::airtable::model::{Record, RecordPage};
use bookshelf::airtable::{ImageSource, RecordSource, StatusError};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCall {
    pub table: String,
    pub view: Option<String>,
    pub offset: Option<String>,
}

/// Returns scripted pages in order and records every request.
#[derive(Clone, Default)]
pub struct RecordingSource {
    responses: Arc<Mutex<VecDeque<Result<RecordPage>>>>,
    calls: Arc<Mutex<Vec<PageCall>>>,
}

impl RecordingSource {
    pub fn with_responses(responses: Vec<Result<RecordPage>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    pub async fn calls(&self) -> Vec<PageCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl RecordSource for RecordingSource {
    async fn fetch_page(
        &self,
        table: &str,
        view: Option<&str>,
        offset: Option<&str>,
    ) -> Result<RecordPage> {
        self.calls.lock().await.push(PageCall {
            table: table.to_string(),
            view: view.map(str::to_string),
            offset: offset.map(str::to_string),
        });
        let mut guard = self.responses.lock().await;
        guard
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted response left")))
    }
}

/// Serves image bytes by URL; unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct FakeImages {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl FakeImages {
    pub async fn serve(&self, url: &str, bytes: &[u8]) {
        self.files.lock().await.insert(url.to_string(), bytes.to_vec());
    }

    pub async fn requested(&self) -> Vec<String> {
        self.requested.lock().await.clone()
    }
}

#[async_trait]
impl ImageSource for FakeImages {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.requested.lock().await.push(url.to_string());
        match self.files.lock().await.get(url) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(StatusError {
                status: StatusCode::NOT_FOUND,
                body: "not found".into(),
            }
            .into()),
        }
    }
}

pub fn record(fields: Value) -> Record {
    serde_json::from_value(serde_json::json!({ "fields": fields })).unwrap()
}

pub fn page(records: Vec<Record>, offset: Option<&str>) -> RecordPage {
    RecordPage {
        records,
        offset: offset.map(str::to_string),
    }
}

pub fn status_error(status: StatusCode, body: &str) -> anyhow::Error {
    StatusError {
        status,
        body: body.to_string(),
    }
    .into()
}
