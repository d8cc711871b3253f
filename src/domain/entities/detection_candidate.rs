//! Detection Candidate (C4)
//!
//! A short-lived, provisional identity awaiting stability: a candidate is
//! created the first time a new-looking embedding appears and is promoted
//! to quality collection once it has been seen for `N_stability` consecutive
//! frames. Owned exclusively by the tracker core; never persisted.

use chrono::{DateTime, Utc};

use crate::domain::value_objects::FaceEmbedding;

/// A provisional identity tracked across consecutive frames pending
/// stability.
#[derive(Debug, Clone)]
pub struct DetectionCandidate {
    candidate_id: String,
    embedding: FaceEmbedding,
    consecutive_count: u32,
    last_seen_ts: DateTime<Utc>,
}

impl DetectionCandidate {
    pub fn new(candidate_id: impl Into<String>, embedding: FaceEmbedding, now: DateTime<Utc>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            embedding,
            consecutive_count: 1,
            last_seen_ts: now,
        }
    }

    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub fn embedding(&self) -> &FaceEmbedding {
        &self.embedding
    }

    pub fn consecutive_count(&self) -> u32 {
        self.consecutive_count
    }

    pub fn last_seen_ts(&self) -> DateTime<Utc> {
        self.last_seen_ts
    }

    /// Records another consecutive sighting of this candidate.
    pub fn observe(&mut self, now: DateTime<Utc>) {
        self.consecutive_count += 1;
        self.last_seen_ts = now;
    }

    /// Whether this candidate has reached the stability threshold.
    pub fn is_stable(&self, n_stability: u32) -> bool {
        self.consecutive_count >= n_stability
    }

    /// Whether this candidate has gone unseen long enough to be evicted.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> bool {
        now - self.last_seen_ts > stale_after
    }
}
