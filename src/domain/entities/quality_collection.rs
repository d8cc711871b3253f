//! Quality Collection (C3)
//!
//! A bounded rolling buffer of recent crops for one stabilized candidate,
//! keyed by the embedding proximity of its first frame (never by
//! bounding-box position — face coordinates jitter frame to frame, and
//! pairing by position drops accumulation and prevents admission).

use chrono::{DateTime, Utc};

use crate::domain::value_objects::FaceEmbedding;

/// One stored frame offered to a quality collection.
#[derive(Debug, Clone)]
pub struct QualityFrame {
    pub cropped_image: Vec<u8>,
    pub sharpness: f32,
}

/// A bounded buffer of recent crops for one stabilized candidate.
#[derive(Debug, Clone)]
pub struct QualityCollection {
    first_embedding: FaceEmbedding,
    frames: Vec<QualityFrame>,
    started_ts: DateTime<Utc>,
    last_seen_ts: DateTime<Utc>,
}

impl QualityCollection {
    pub fn new(first_embedding: FaceEmbedding, now: DateTime<Utc>) -> Self {
        Self {
            first_embedding,
            frames: Vec::new(),
            started_ts: now,
            last_seen_ts: now,
        }
    }

    pub fn first_embedding(&self) -> &FaceEmbedding {
        &self.first_embedding
    }

    pub fn frames(&self) -> &[QualityFrame] {
        &self.frames
    }

    pub fn started_ts(&self) -> DateTime<Utc> {
        self.started_ts
    }

    pub fn last_seen_ts(&self) -> DateTime<Utc> {
        self.last_seen_ts
    }

    /// Appends a new crop and sharpness score, refreshing `last_seen_ts`.
    pub fn push(&mut self, cropped_image: Vec<u8>, sharpness: f32, now: DateTime<Utc>) {
        self.frames.push(QualityFrame { cropped_image, sharpness });
        self.last_seen_ts = now;
    }

    /// Whether the collection has received enough frames to select from.
    pub fn is_ready(&self, n_quality: usize) -> bool {
        self.frames.len() >= n_quality
    }

    /// Whether this collection has gone unseen long enough to be evicted.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> bool {
        now - self.last_seen_ts > stale_after
    }

    /// Selects the sharpest frame, breaking ties by earliest insertion.
    /// Returns `None` only if the collection is empty.
    pub fn select_best(&self) -> Option<&QualityFrame> {
        self.frames
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| {
                a.sharpness
                    .partial_cmp(&b.sharpness)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| ib.cmp(ia))
            })
            .map(|(_, frame)| frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding() -> FaceEmbedding {
        FaceEmbedding::new(vec![0.2; 128])
    }

    #[test]
    fn select_best_picks_maximum_sharpness() {
        let mut collection = QualityCollection::new(embedding(), Utc::now());
        collection.push(vec![1], 80.0, Utc::now());
        collection.push(vec![2], 220.0, Utc::now());
        collection.push(vec![3], 150.0, Utc::now());
        let best = collection.select_best().unwrap();
        assert_eq!(best.cropped_image, vec![2]);
        assert_eq!(best.sharpness, 220.0);
    }

    #[test]
    fn select_best_breaks_ties_by_earliest_insertion() {
        let mut collection = QualityCollection::new(embedding(), Utc::now());
        collection.push(vec![1], 200.0, Utc::now());
        collection.push(vec![2], 200.0, Utc::now());
        let best = collection.select_best().unwrap();
        assert_eq!(best.cropped_image, vec![1]);
    }

    #[test]
    fn is_ready_once_n_quality_frames_collected() {
        let mut collection = QualityCollection::new(embedding(), Utc::now());
        assert!(!collection.is_ready(5));
        for i in 0..5 {
            collection.push(vec![i], 100.0 + i as f32, Utc::now());
        }
        assert!(collection.is_ready(5));
    }
}
