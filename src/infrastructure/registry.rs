//! JSON Registry (C2)
//!
//! Durable `person_id -> RegistryEntry` mapping, persisted as a single JSON
//! file rewritten on every mutating call. All mutations serialize through
//! one `tokio::sync::Mutex`, which satisfies §5's "no reentrancy" rule and
//! guarantees later faces within the same frame observe earlier admissions
//! (§4.2 step 2's snapshot requirement).

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::entities::{EnrichmentState, RegistryEntry};
use crate::domain::ports::{Registry, RegistryError, RegistryResult};
use crate::domain::value_objects::FaceEmbedding;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryState {
    next_ordinal: u64,
    entries: HashMap<String, RegistryEntry>,
}

/// File-backed implementation of the durable registry (C2).
pub struct JsonRegistry {
    path: PathBuf,
    state: Mutex<RegistryState>,
}

impl JsonRegistry {
    /// Loads an existing registry file, or starts empty if absent. A
    /// corrupt file is moved aside and a fresh registry is started rather
    /// than failing startup.
    pub async fn open(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<RegistryState>(&bytes) {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "registry file is corrupt, starting fresh");
                    let backup = path.with_extension("json.corrupt");
                    let _ = tokio::fs::rename(&path, &backup).await;
                    RegistryState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RegistryState::default(),
            Err(e) => return Err(RegistryError::Io(e)),
        };
        Ok(Self { path, state: Mutex::new(state) })
    }

    async fn persist(&self, state: &RegistryState) -> RegistryResult<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Registry for JsonRegistry {
    async fn allocate_id(&self) -> RegistryResult<String> {
        let mut state = self.state.lock().await;
        state.next_ordinal += 1;
        let id = format!("person_{:03}", state.next_ordinal);
        self.persist(&state).await?;
        Ok(id)
    }

    async fn insert(&self, entry: RegistryEntry) -> RegistryResult<()> {
        let mut state = self.state.lock().await;
        state.entries.insert(entry.person_id.clone(), entry);
        self.persist(&state).await
    }

    async fn touch(&self, id: &str, now: DateTime<Utc>) -> RegistryResult<()> {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.entries.get_mut(id) {
            entry.touch(now);
            self.persist(&state).await?;
        }
        Ok(())
    }

    async fn update_enrichment(&self, id: &str, new_state: EnrichmentState) -> RegistryResult<()> {
        let mut state = self.state.lock().await;
        let changed = match state.entries.get_mut(id) {
            Some(entry) => entry.apply_enrichment(new_state),
            None => false,
        };
        if changed {
            self.persist(&state).await?;
        }
        Ok(())
    }

    async fn update_remote_url(&self, id: &str, url: String) -> RegistryResult<()> {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.entries.get_mut(id) {
            entry.set_remote_url(url);
            self.persist(&state).await?;
        }
        Ok(())
    }

    async fn all_reference_embeddings(&self) -> Vec<(String, FaceEmbedding)> {
        let state = self.state.lock().await;
        state.entries.values().map(|e| (e.person_id.clone(), e.reference_embedding.clone())).collect()
    }

    async fn get(&self, id: &str) -> Option<RegistryEntry> {
        self.state.lock().await.entries.get(id).cloned()
    }

    async fn save_to_disk(&self) -> RegistryResult<()> {
        let state = self.state.lock().await;
        self.persist(&state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding() -> FaceEmbedding {
        FaceEmbedding::new(vec![0.1; 128])
    }

    #[tokio::test]
    async fn fresh_path_starts_empty_and_allocates_sequential_ids() {
        let dir = tempfile::tempdir().unwrap();
        let registry = JsonRegistry::open(dir.path().join("registry.json")).await.unwrap();
        assert_eq!(registry.allocate_id().await.unwrap(), "person_001");
        assert_eq!(registry.allocate_id().await.unwrap(), "person_002");
    }

    #[tokio::test]
    async fn insert_then_reopen_restores_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let registry = JsonRegistry::open(&path).await.unwrap();
        let id = registry.allocate_id().await.unwrap();
        let entry = RegistryEntry::new(id.clone(), "k.png".into(), 150.0, 100.0, embedding(), Utc::now());
        registry.insert(entry).await.unwrap();

        let reopened = JsonRegistry::open(&path).await.unwrap();
        let restored = reopened.get(&id).await.unwrap();
        assert_eq!(restored.person_id, id);
    }

    #[tokio::test]
    async fn corrupt_file_recovers_to_an_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        tokio::fs::write(&path, b"not valid json").await.unwrap();
        let registry = JsonRegistry::open(&path).await.unwrap();
        assert!(registry.all_reference_embeddings().await.is_empty());
        assert!(tokio::fs::metadata(path.with_extension("json.corrupt")).await.is_ok());
    }

    #[tokio::test]
    async fn update_enrichment_rejects_illegal_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let registry = JsonRegistry::open(dir.path().join("registry.json")).await.unwrap();
        let id = registry.allocate_id().await.unwrap();
        let entry = RegistryEntry::new(id.clone(), "k.png".into(), 150.0, 100.0, embedding(), Utc::now());
        registry.insert(entry).await.unwrap();

        registry.update_enrichment(&id, EnrichmentState::Completed {
            full_name: None,
            display_text: "hi".into(),
            image_urls: vec![],
        }).await.unwrap();
        registry.update_enrichment(&id, EnrichmentState::Scraping).await.unwrap();

        let entry = registry.get(&id).await.unwrap();
        assert!(entry.enrichment.is_terminal());
    }

    #[tokio::test]
    async fn update_remote_url_persists_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let registry = JsonRegistry::open(&path).await.unwrap();
        let id = registry.allocate_id().await.unwrap();
        let entry = RegistryEntry::new(id.clone(), "k.png".into(), 150.0, 100.0, embedding(), Utc::now());
        registry.insert(entry).await.unwrap();

        registry.update_remote_url(&id, "https://cdn.example.com/k.png".into()).await.unwrap();

        let reopened = JsonRegistry::open(&path).await.unwrap();
        let restored = reopened.get(&id).await.unwrap();
        assert_eq!(restored.remote_url.as_deref(), Some("https://cdn.example.com/k.png"));
    }
}
