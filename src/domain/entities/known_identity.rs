//! Known Identity
//!
//! A pre-enrolled identity in the recognition set (C1): a name plus one or
//! more reference embeddings. Loaded at startup and read far more often
//! than it is mutated.

use crate::domain::value_objects::FaceEmbedding;

/// A pre-enrolled, named identity with one or more reference embeddings.
#[derive(Debug, Clone)]
pub struct KnownIdentity {
    name: String,
    embeddings: Vec<FaceEmbedding>,
}

impl KnownIdentity {
    /// Creates a known identity. Panics if `embeddings` is empty — the
    /// known set is read-mostly and every entry must be usable for
    /// recognition probes.
    pub fn new(name: impl Into<String>, embeddings: Vec<FaceEmbedding>) -> Self {
        assert!(
            !embeddings.is_empty(),
            "a known identity must have at least one reference embedding"
        );
        Self {
            name: name.into(),
            embeddings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn embeddings(&self) -> &[FaceEmbedding] {
        &self.embeddings
    }

    /// The smallest distance from `embedding` to any of this identity's
    /// reference embeddings.
    pub fn nearest_distance(&self, embedding: &FaceEmbedding) -> f32 {
        self.embeddings
            .iter()
            .map(|reference| reference.distance(embedding))
            .fold(f32::INFINITY, f32::min)
    }
}
