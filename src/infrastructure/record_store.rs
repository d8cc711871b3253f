//! External Record Store HTTP Client (C7's collaborator)
//!
//! Queries an external table for the row whose `trigger_image_url` contains
//! the given `image_key`. Any query language satisfies the port; this client
//! speaks a simple REST convention (`GET {base_url}/records?trigger_contains=...`)
//! and leaves the substring match to the remote service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::ports::{ExternalRecord, RecordStore, RecordStoreError, RecordStoreResult};

#[derive(Debug, Deserialize)]
struct RecordRow {
    trigger_image_url: String,
    text_to_display: Option<String>,
    result_image_urls: Option<Vec<String>>,
    full_name: Option<String>,
}

impl From<RecordRow> for ExternalRecord {
    fn from(row: RecordRow) -> Self {
        Self {
            trigger: row.trigger_image_url,
            display_text: row.text_to_display,
            image_urls: row.result_image_urls,
            full_name: row.full_name,
        }
    }
}

/// HTTP implementation of the record-store query port (C7).
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordStore {
    pub fn new(base_url: String) -> RecordStoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RecordStoreError::Permanent(format!("failed to build http client: {e}")))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn find_by_image_key(&self, image_key: &str) -> RecordStoreResult<Option<ExternalRecord>> {
        let url = format!("{}/records", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("trigger_contains", image_key)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    RecordStoreError::Transient(e.to_string())
                } else {
                    RecordStoreError::Permanent(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(RecordStoreError::Transient(format!("record store returned {status}")));
        }
        if !status.is_success() {
            return Err(RecordStoreError::Permanent(format!("record store returned {status}")));
        }

        let rows: Vec<RecordRow> = response
            .json()
            .await
            .map_err(|e| RecordStoreError::Permanent(format!("invalid record store response: {e}")))?;

        Ok(rows
            .into_iter()
            .find(|row| row.trigger_image_url.contains(image_key))
            .map(ExternalRecord::from))
    }
}
