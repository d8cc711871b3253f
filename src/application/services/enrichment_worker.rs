//! Enrichment Worker (C7)
//!
//! One polling task per admitted id, reconciling an external record store's
//! results back into the registry. Writes are write-only to C2; the worker
//! never caches state itself (§4.6).

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::entities::EnrichmentState;
use crate::domain::ports::{RecordStore, RecordStoreError, Registry};

/// Spawns and configures per-id enrichment poll tasks.
#[derive(Clone)]
pub struct EnrichmentWorker {
    registry: Arc<dyn Registry>,
    record_store: Arc<dyn RecordStore>,
    t_poll: Duration,
    t_poll_max: Duration,
}

impl EnrichmentWorker {
    pub fn new(
        registry: Arc<dyn Registry>,
        record_store: Arc<dyn RecordStore>,
        t_poll: Duration,
        t_poll_max: Duration,
    ) -> Self {
        Self {
            registry,
            record_store,
            t_poll,
            t_poll_max,
        }
    }

    /// Registers an enrichment task for a newly admitted id (§4.6 worker
    /// lifecycle). Returns the task's join handle; callers need not await it.
    pub fn spawn(&self, person_id: String, image_key: String) -> tokio::task::JoinHandle<()> {
        let registry = self.registry.clone();
        let record_store = self.record_store.clone();
        let t_poll = self.t_poll;
        let t_poll_max = self.t_poll_max;
        tokio::spawn(async move {
            poll_until_terminal(registry, record_store, person_id, image_key, t_poll, t_poll_max).await;
        })
    }
}

async fn poll_until_terminal(
    registry: Arc<dyn Registry>,
    record_store: Arc<dyn RecordStore>,
    person_id: String,
    image_key: String,
    t_poll: Duration,
    t_poll_max: Duration,
) {
    let deadline = Instant::now() + t_poll_max;
    loop {
        if Instant::now() >= deadline {
            warn!(person_id = %person_id, "enrichment poll exceeded T_poll_max, leaving in scraping");
            return;
        }

        match record_store.find_by_image_key(&image_key).await {
            Ok(Some(record)) => match (record.display_text, record.image_urls) {
                (Some(display_text), Some(image_urls))
                    if !display_text.is_empty() && !image_urls.is_empty() =>
                {
                    let completed = EnrichmentState::Completed {
                        full_name: record.full_name,
                        display_text,
                        image_urls: image_urls.into_iter().take(3).collect(),
                    };
                    let _ = registry.update_enrichment(&person_id, completed).await;
                    return;
                }
                _ => {
                    let _ = registry.update_enrichment(&person_id, EnrichmentState::Scraping).await;
                }
            },
            Ok(None) => {
                let _ = registry.update_enrichment(&person_id, EnrichmentState::Scraping).await;
            }
            Err(RecordStoreError::Permanent(reason)) => {
                let _ = registry.update_enrichment(&person_id, EnrichmentState::Error { reason }).await;
                return;
            }
            Err(RecordStoreError::Transient(reason)) => {
                debug!(person_id = %person_id, reason = %reason, "transient record store error, retrying");
            }
        }

        tokio::time::sleep(t_poll).await;
    }
}
