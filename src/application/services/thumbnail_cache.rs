//! Thumbnail Cache (C8)
//!
//! Process-wide map from URL to decoded image bytes. A cache hit is
//! immediate; a miss performs a synchronous bounded-timeout fetch and stores
//! the result. Failed fetches are never cached so a later frame may retry
//! (§4.8). Owned by the pipeline thread; an internal mutex guards the map
//! only because the fetcher itself is `.await`ed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

pub type ThumbnailResult<T> = Result<T, ThumbnailError>;

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("thumbnail fetch failed: {0}")]
    Fetch(String),

    #[error("thumbnail fetch timed out")]
    Timeout,
}

/// Fetches raw image bytes for a URL (consumed interface, swappable in tests).
#[async_trait]
pub trait ThumbnailFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ThumbnailResult<Vec<u8>>;
}

/// Default `reqwest`-backed fetcher.
pub struct ReqwestThumbnailFetcher {
    client: reqwest::Client,
}

impl ReqwestThumbnailFetcher {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for ReqwestThumbnailFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThumbnailFetcher for ReqwestThumbnailFetcher {
    async fn fetch(&self, url: &str) -> ThumbnailResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ThumbnailError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| ThumbnailError::Fetch(e.to_string()))?;
        let bytes = response.bytes().await.map_err(|e| ThumbnailError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// The process-wide URL → decoded image cache (C8).
pub struct ThumbnailCache {
    cache: Mutex<HashMap<String, Vec<u8>>>,
    fetcher: Arc<dyn ThumbnailFetcher>,
    timeout: Duration,
}

impl ThumbnailCache {
    pub fn new(fetcher: Arc<dyn ThumbnailFetcher>, timeout: Duration) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            fetcher,
            timeout,
        }
    }

    /// Returns the cached or freshly fetched bytes for `url`, or `None` on a
    /// miss that also fails to fetch. A failed fetch is never cached.
    pub async fn get_or_fetch(&self, url: &str) -> Option<Vec<u8>> {
        if let Some(hit) = self.cache.lock().await.get(url).cloned() {
            return Some(hit);
        }

        match tokio::time::timeout(self.timeout, self.fetcher.fetch(url)).await {
            Ok(Ok(bytes)) => {
                self.cache.lock().await.insert(url.to_string(), bytes.clone());
                Some(bytes)
            }
            Ok(Err(e)) => {
                debug!(url, error = %e, "thumbnail fetch failed, not cached");
                None
            }
            Err(_) => {
                debug!(url, "thumbnail fetch timed out, not cached");
                None
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
