//! Pipeline Configuration
//!
//! Loads configuration from environment variables, `dotenvy`-style, each
//! field carrying a sensible default. Config loading itself is out of
//! scope for the tracking core, but the loader follows the same idiom as
//! the rest of the ambient stack.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// All tunables for the tracking and enrichment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Max embedding distance for a known-set recognition match (§4.1).
    pub tau_recog: f32,
    /// Max embedding distance for duplicate suppression against C2 (§4.2).
    pub tau_dup: f32,
    /// Consecutive frames required before a candidate is admission-eligible.
    pub n_stability: usize,
    /// Frames collected for the quality handoff arg-max sharpness pick.
    pub n_quality: usize,
    /// Minimum sharpness score required to admit when quality checks are on.
    pub q_min: f32,
    /// Whether the quality gate is enforced at all (§4.2 step 5).
    pub enable_quality_check: bool,
    /// Seconds a stale, unconfirmed candidate is retained before eviction.
    pub t_candidate_stale_secs: u64,
    /// Seconds between enrichment poll attempts (§4.6).
    pub t_poll_secs: u64,
    /// Seconds before an enrichment poll gives up and stays in `Scraping`.
    pub t_poll_max_secs: u64,
    /// Seconds before a thumbnail fetch is treated as failed (§4.8).
    pub thumbnail_fetch_timeout_secs: u64,
    /// Path to the durable registry JSON file (C2).
    pub registry_path: PathBuf,
    /// Directory of labeled reference images used to seed the known set (C1).
    pub known_faces_dir: PathBuf,
    /// Directory where admitted stills are written before upload.
    pub stills_dir: PathBuf,
    /// Object-store bucket name (C6).
    pub object_store_bucket: String,
    /// Key prefix applied to every uploaded still.
    pub object_store_prefix: String,
    /// Object-store endpoint URL.
    pub object_store_endpoint_url: String,
    /// Object-store access key id.
    pub object_store_access_key_id: String,
    /// Object-store secret access key.
    pub object_store_secret_access_key: String,
    /// Object-store region.
    pub object_store_region: String,
    /// Public base URL used to construct a still's returned URL.
    pub object_store_public_base_url: String,
    /// Base URL of the external record store queried by C7.
    pub record_store_base_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("face-tracker");

        Self {
            tau_recog: 0.6,
            tau_dup: 0.45,
            n_stability: 5,
            n_quality: 5,
            q_min: 100.0,
            enable_quality_check: true,
            t_candidate_stale_secs: 2,
            t_poll_secs: 1,
            t_poll_max_secs: 300,
            thumbnail_fetch_timeout_secs: 2,
            registry_path: data_dir.join("registry.json"),
            known_faces_dir: data_dir.join("known_faces"),
            stills_dir: data_dir.join("stills"),
            object_store_bucket: "face-tracker".to_string(),
            object_store_prefix: "stills".to_string(),
            object_store_endpoint_url: String::new(),
            object_store_access_key_id: String::new(),
            object_store_secret_access_key: String::new(),
            object_store_region: "auto".to_string(),
            object_store_public_base_url: String::new(),
            record_store_base_url: String::new(),
        }
    }
}

impl PipelineConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(v) = std::env::var("TAU_RECOG") {
            config.tau_recog = v.parse().unwrap_or(config.tau_recog);
        }
        if let Ok(v) = std::env::var("TAU_DUP") {
            config.tau_dup = v.parse().unwrap_or(config.tau_dup);
        }
        if let Ok(v) = std::env::var("N_STABILITY") {
            config.n_stability = v.parse().unwrap_or(config.n_stability);
        }
        if let Ok(v) = std::env::var("N_QUALITY") {
            config.n_quality = v.parse().unwrap_or(config.n_quality);
        }
        if let Ok(v) = std::env::var("Q_MIN") {
            config.q_min = v.parse().unwrap_or(config.q_min);
        }
        if let Ok(v) = std::env::var("ENABLE_QUALITY_CHECK") {
            config.enable_quality_check = v.parse().unwrap_or(config.enable_quality_check);
        }
        if let Ok(v) = std::env::var("T_CANDIDATE_STALE_SECS") {
            config.t_candidate_stale_secs = v.parse().unwrap_or(config.t_candidate_stale_secs);
        }
        if let Ok(v) = std::env::var("T_POLL_SECS") {
            config.t_poll_secs = v.parse().unwrap_or(config.t_poll_secs);
        }
        if let Ok(v) = std::env::var("T_POLL_MAX_SECS") {
            config.t_poll_max_secs = v.parse().unwrap_or(config.t_poll_max_secs);
        }
        if let Ok(v) = std::env::var("THUMBNAIL_FETCH_TIMEOUT_SECS") {
            config.thumbnail_fetch_timeout_secs = v.parse().unwrap_or(config.thumbnail_fetch_timeout_secs);
        }
        if let Ok(v) = std::env::var("REGISTRY_PATH") {
            config.registry_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("KNOWN_FACES_DIR") {
            config.known_faces_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("STILLS_DIR") {
            config.stills_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("OBJECT_STORE_BUCKET") {
            config.object_store_bucket = v;
        }
        if let Ok(v) = std::env::var("OBJECT_STORE_PREFIX") {
            config.object_store_prefix = v;
        }
        if let Ok(v) = std::env::var("OBJECT_STORE_ENDPOINT_URL") {
            config.object_store_endpoint_url = v;
        }
        if let Ok(v) = std::env::var("OBJECT_STORE_ACCESS_KEY_ID") {
            config.object_store_access_key_id = v;
        }
        if let Ok(v) = std::env::var("OBJECT_STORE_SECRET_ACCESS_KEY") {
            config.object_store_secret_access_key = v;
        }
        if let Ok(v) = std::env::var("OBJECT_STORE_REGION") {
            config.object_store_region = v;
        }
        if let Ok(v) = std::env::var("OBJECT_STORE_PUBLIC_BASE_URL") {
            config.object_store_public_base_url = v;
        }
        if let Ok(v) = std::env::var("RECORD_STORE_BASE_URL") {
            config.record_store_base_url = v;
        }

        Ok(config)
    }
}
