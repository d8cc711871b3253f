//! Known-Set Loader (supplements C1)
//!
//! Builds the pre-enrolled known set from a directory of labeled images —
//! one subdirectory per name — computing each reference embedding once at
//! startup via the embedder interface. The known set stays rebuildable on
//! demand behind `KnownSet::rebuild`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::services::KnownSet;
use crate::domain::entities::KnownIdentity;
use crate::domain::ports::{FaceDetector, Frame};
use crate::domain::value_objects::BoundingBox;

#[derive(Debug, Error)]
pub enum KnownSetLoadError {
    #[error("known faces directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("I/O error reading known faces directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Decodes a raw image file into a `Frame`. The pipeline's production
/// decoder is injected here too, so the loader never assumes a pixel format.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Option<Frame>;
}

/// Walks `known_faces_dir`, embedding every image under each name's
/// subdirectory, and installs the result into `known_set`. A name
/// subdirectory with zero decodable images is skipped with a warning rather
/// than failing the whole load.
pub async fn load_known_set(
    known_faces_dir: &Path,
    decoder: &dyn ImageDecoder,
    detector: &dyn FaceDetector,
    embedder: &dyn crate::domain::ports::FaceEmbedder,
    known_set: Arc<KnownSet>,
) -> Result<usize, KnownSetLoadError> {
    if !known_faces_dir.is_dir() {
        return Err(KnownSetLoadError::MissingDirectory(known_faces_dir.to_path_buf()));
    }

    let mut identities = Vec::new();
    let mut dir_entries = tokio::fs::read_dir(known_faces_dir).await?;
    while let Some(entry) = dir_entries.next_entry().await? {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let embeddings = embeddings_for_person(&path, decoder, detector, embedder).await?;
        if embeddings.is_empty() {
            warn!(name, path = %path.display(), "no decodable reference images, skipping");
            continue;
        }
        identities.push(KnownIdentity::new(name, embeddings));
    }

    let loaded = identities.len();
    known_set.rebuild(identities).await;
    info!(loaded, dir = %known_faces_dir.display(), "known set loaded");
    Ok(loaded)
}

async fn embeddings_for_person(
    person_dir: &Path,
    decoder: &dyn ImageDecoder,
    detector: &dyn FaceDetector,
    embedder: &dyn crate::domain::ports::FaceEmbedder,
) -> Result<Vec<crate::domain::value_objects::FaceEmbedding>, KnownSetLoadError> {
    let mut embeddings = Vec::new();
    let mut files = tokio::fs::read_dir(person_dir).await?;
    while let Some(entry) = files.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let bytes = tokio::fs::read(&path).await?;
        let Some(frame) = decoder.decode(&bytes) else {
            warn!(path = %path.display(), "failed to decode reference image, skipping");
            continue;
        };

        let boxes = detector.detect(&frame);
        let bounding_box = boxes
            .into_iter()
            .next()
            .unwrap_or_else(|| BoundingBox::new(0, 0, frame.width as i32, frame.height as i32));
        embeddings.push(embedder.embed(&frame, &bounding_box));
    }
    Ok(embeddings)
}
