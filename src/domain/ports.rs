//! Domain Ports
//!
//! Trait boundaries between the tracker core and its collaborators
//! (Dependency Inversion Principle). Concrete implementations live in
//! `infrastructure`.

use async_trait::async_trait;

use crate::domain::entities::{EnrichmentState, RegistryEntry};
use crate::domain::value_objects::{BoundingBox, FaceEmbedding};

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry error types (C2).
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("registry file is corrupt: {0}")]
    Corrupt(String),
}

/// Durable mapping from `person_id` to its `RegistryEntry` (C2).
#[async_trait]
pub trait Registry: Send + Sync {
    /// Allocates the next monotonic `person_id`, never reused.
    async fn allocate_id(&self) -> RegistryResult<String>;

    /// Durably inserts a newly admitted entry.
    async fn insert(&self, entry: RegistryEntry) -> RegistryResult<()>;

    /// Records a re-observation of an existing id. No-op if missing.
    async fn touch(&self, id: &str, now: chrono::DateTime<chrono::Utc>) -> RegistryResult<()>;

    /// Atomically applies an enrichment transition. No-op if missing or if
    /// the transition is illegal per `EnrichmentState::can_transition_to`.
    async fn update_enrichment(&self, id: &str, new_state: EnrichmentState) -> RegistryResult<()>;

    /// Records the object-store URL of the saved still after a successful
    /// upload (§3's `remote_url`). No-op if missing.
    async fn update_remote_url(&self, id: &str, url: String) -> RegistryResult<()>;

    /// Snapshot of `(person_id, reference_embedding)` pairs for the
    /// duplicate gate (§4.2 step 2).
    async fn all_reference_embeddings(&self) -> Vec<(String, FaceEmbedding)>;

    /// Fetches a single entry by id.
    async fn get(&self, id: &str) -> Option<RegistryEntry>;

    /// Persists the current state to disk, if not already durable.
    async fn save_to_disk(&self) -> RegistryResult<()>;
}

/// Result type for local still-writing operations.
pub type StillsResult<T> = Result<T, StillsError>;

#[derive(Debug, thiserror::Error)]
pub enum StillsError {
    #[error("stills I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes an admitted face's cropped still to local disk, keyed by
/// `image_key` (§6 "Saved stills"). Always written before the object-store
/// upload is attempted, so a failed upload never loses the image (§4.5).
#[async_trait]
pub trait StillsStore: Send + Sync {
    async fn save(&self, image_key: &str, bytes: &[u8]) -> StillsResult<()>;
}

/// Result type for object-store operations.
pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object store configuration error: {0}")]
    Config(String),

    #[error("object store upload failed: {0}")]
    Upload(String),
}

/// Uploads a saved still and returns its public URL (C6).
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> ObjectStoreResult<String>;
}

/// Result type for record-store queries.
pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("record store transient error: {0}")]
    Transient(String),

    #[error("record store permanent error: {0}")]
    Permanent(String),
}

/// One externally sourced record matched against an `image_key`.
#[derive(Debug, Clone)]
pub struct ExternalRecord {
    pub trigger: String,
    pub display_text: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub full_name: Option<String>,
}

/// Queries the external record store for a row whose trigger field contains
/// `image_key` (C7's collaborator).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_image_key(&self, image_key: &str) -> RecordStoreResult<Option<ExternalRecord>>;
}

/// A single captured frame: dimensions plus a pixel buffer.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Produces frames from a video source (consumed interface, §6).
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Detects face bounding boxes in a frame (consumed interface, §6).
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Vec<BoundingBox>;
}

/// Computes a face embedding for a cropped region (consumed interface, §6).
pub trait FaceEmbedder: Send + Sync {
    fn embed(&self, frame: &Frame, bounding_box: &BoundingBox) -> FaceEmbedding;
}

/// Extracts an encoded image (PNG recommended) for one bounding box within a
/// frame, for sharpness scoring and quality-collection storage.
pub trait FrameCropper: Send + Sync {
    fn crop(&self, frame: &Frame, bounding_box: &BoundingBox) -> Vec<u8>;
}

/// Computes a sharpness score for a cropped image, larger = sharper
/// (consumed interface, §6).
pub trait SharpnessMetric: Send + Sync {
    fn sharpness(&self, cropped_image: &[u8]) -> f32;
}
