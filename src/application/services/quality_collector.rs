//! Quality Collector (C3)
//!
//! Flat, owned table of pending quality collections, one per stabilized
//! candidate. Collections are located by embedding proximity to the first
//! stored frame — never by bounding-box position, which jitters frame to
//! frame and would reset accumulation every frame (§4.2).

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::{QualityCollection, QualityFrame};
use crate::domain::value_objects::FaceEmbedding;

/// Flat, owned table of pending quality collections (C3).
#[derive(Default)]
pub struct QualityCollector {
    collections: std::collections::HashMap<String, QualityCollection>,
    next_ordinal: u64,
}

impl QualityCollector {
    pub fn new() -> Self {
        Self {
            collections: std::collections::HashMap::new(),
            next_ordinal: 1,
        }
    }

    /// Drops collections that have received no new frame within the stale
    /// window.
    pub fn evict_stale(&mut self, now: DateTime<Utc>, stale_after: Duration) {
        self.collections.retain(|_, collection| !collection.is_stale(now, stale_after));
    }

    /// Finds the pending collection whose first embedding is within
    /// `tau_dup` of `embedding`, or begins a new one. Appends the supplied
    /// crop/sharpness pair either way. Returns the handle and whether the
    /// collection is now ready for selection.
    pub fn offer(
        &mut self,
        embedding: &FaceEmbedding,
        tau_dup: f32,
        cropped_image: Vec<u8>,
        sharpness: f32,
        n_quality: usize,
        now: DateTime<Utc>,
    ) -> (String, bool) {
        let matched = self
            .collections
            .iter()
            .map(|(handle, collection)| (handle.clone(), collection.first_embedding().distance(embedding)))
            .filter(|(_, distance)| *distance <= tau_dup)
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(handle, _)| handle);

        let handle = matched.unwrap_or_else(|| {
            let handle = format!("qcol_{}", self.next_ordinal);
            self.next_ordinal += 1;
            self.collections.insert(handle.clone(), QualityCollection::new(embedding.clone(), now));
            handle
        });

        let collection = self.collections.get_mut(&handle).expect("handle came from this map");
        collection.push(cropped_image, sharpness, now);
        let ready = collection.is_ready(n_quality);
        (handle, ready)
    }

    /// Removes and returns a completed collection's best frame.
    pub fn take_best(&mut self, handle: &str) -> Option<QualityFrame> {
        self.collections.remove(handle).and_then(|collection| collection.select_best().cloned())
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(value: f32) -> FaceEmbedding {
        FaceEmbedding::new(vec![value; 128])
    }

    #[test]
    fn first_offer_creates_a_new_collection() {
        let mut collector = QualityCollector::new();
        let (_, ready) = collector.offer(&embedding(0.0), 0.45, vec![1], 100.0, 5, Utc::now());
        assert!(!ready);
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn subsequent_offers_pair_by_embedding_not_position() {
        let mut collector = QualityCollector::new();
        let now = Utc::now();
        let (handle1, _) = collector.offer(&embedding(0.0), 0.45, vec![1], 100.0, 5, now);
        let (handle2, _) = collector.offer(&embedding(0.01), 0.45, vec![2], 120.0, 5, now);
        assert_eq!(handle1, handle2);
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn reaches_ready_after_n_quality_frames() {
        let mut collector = QualityCollector::new();
        let now = Utc::now();
        let mut handle = String::new();
        let mut ready = false;
        for i in 0..5 {
            let (h, r) = collector.offer(&embedding(0.0), 0.45, vec![i], 100.0 + i as f32, 5, now);
            handle = h;
            ready = r;
        }
        assert!(ready);
        let best = collector.take_best(&handle).unwrap();
        assert_eq!(best.sharpness, 104.0);
    }

    #[test]
    fn distant_embedding_starts_a_distinct_collection() {
        let mut collector = QualityCollector::new();
        let now = Utc::now();
        collector.offer(&embedding(0.0), 0.45, vec![1], 100.0, 5, now);
        collector.offer(&embedding(9.0), 0.45, vec![2], 100.0, 5, now);
        assert_eq!(collector.len(), 2);
    }
}
