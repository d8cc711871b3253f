//! Registry Entry
//!
//! The durable record of one admitted identity: first/last seen timestamps,
//! detection count, the saved still's key, quality rating, the reference
//! embedding used for future duplicate checks, and enrichment progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::EnrichmentState;
use crate::domain::value_objects::FaceEmbedding;

/// Quality label assigned to the saved still, downgraded when sharpness
/// falls short of `Q_min`. Admission itself is never blocked by this rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityRating {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl QualityRating {
    /// Buckets a sharpness score into a rating. `q_min` is the threshold
    /// below which the label is downgraded to `Fair`/`Poor`; values at or
    /// above it are graded on a simple relative scale.
    pub fn from_sharpness(sharpness: f32, q_min: f32) -> Self {
        if sharpness < q_min * 0.5 {
            QualityRating::Poor
        } else if sharpness < q_min {
            QualityRating::Fair
        } else if sharpness < q_min * 1.5 {
            QualityRating::Good
        } else if sharpness < q_min * 2.0 {
            QualityRating::VeryGood
        } else {
            QualityRating::Excellent
        }
    }
}

/// A durable record of one admitted identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub person_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub detection_count: u64,
    pub image_key: String,
    pub sharpness: f32,
    pub quality_rating: QualityRating,
    pub reference_embedding: FaceEmbedding,
    pub enrichment: EnrichmentState,
    pub remote_url: Option<String>,
}

impl RegistryEntry {
    /// Creates a new entry at admission time. `detection_count` starts at 1,
    /// `enrichment` starts `Pending`, and `remote_url` starts absent.
    pub fn new(
        person_id: String,
        image_key: String,
        sharpness: f32,
        q_min: f32,
        reference_embedding: FaceEmbedding,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            person_id,
            first_seen: now,
            last_seen: now,
            detection_count: 1,
            image_key,
            sharpness,
            quality_rating: QualityRating::from_sharpness(sharpness, q_min),
            reference_embedding,
            enrichment: EnrichmentState::Pending,
            remote_url: None,
        }
    }

    /// Records a re-observation: bumps `last_seen` and `detection_count`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
        self.detection_count += 1;
    }

    /// Applies an enrichment transition, enforcing monotonicity. Returns
    /// true if the state actually changed.
    pub fn apply_enrichment(&mut self, next: EnrichmentState) -> bool {
        if !self.enrichment.can_transition_to(&next) {
            return false;
        }
        self.enrichment = next;
        true
    }

    pub fn set_remote_url(&mut self, url: String) {
        self.remote_url = Some(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(value: f32) -> FaceEmbedding {
        FaceEmbedding::new(vec![value; 128])
    }

    #[test]
    fn new_entry_starts_pending_with_detection_count_one() {
        let entry = RegistryEntry::new(
            "person_001".into(),
            "person_001_123.png".into(),
            200.0,
            100.0,
            embedding(0.1),
            Utc::now(),
        );
        assert_eq!(entry.detection_count, 1);
        assert_eq!(entry.enrichment, EnrichmentState::Pending);
        assert!(entry.remote_url.is_none());
    }

    #[test]
    fn touch_increments_detection_count_and_bumps_last_seen() {
        let first_seen = Utc::now();
        let mut entry = RegistryEntry::new(
            "person_001".into(),
            "person_001_123.png".into(),
            200.0,
            100.0,
            embedding(0.1),
            first_seen,
        );
        let later = first_seen + chrono::Duration::seconds(5);
        entry.touch(later);
        assert_eq!(entry.detection_count, 2);
        assert_eq!(entry.last_seen, later);
        assert_eq!(entry.first_seen, first_seen);
    }

    #[test]
    fn apply_enrichment_rejects_illegal_transition() {
        let mut entry = RegistryEntry::new(
            "person_001".into(),
            "k".into(),
            200.0,
            100.0,
            embedding(0.1),
            Utc::now(),
        );
        assert!(entry.apply_enrichment(EnrichmentState::Completed {
            full_name: None,
            display_text: "hi".into(),
            image_urls: vec![],
        }));
        let changed = entry.apply_enrichment(EnrichmentState::Scraping);
        assert!(!changed);
        assert!(entry.enrichment.is_terminal());
    }

    #[test]
    fn sharpness_below_q_min_yields_downgraded_rating() {
        assert_eq!(QualityRating::from_sharpness(40.0, 100.0), QualityRating::Poor);
        assert_eq!(QualityRating::from_sharpness(80.0, 100.0), QualityRating::Fair);
        assert_eq!(QualityRating::from_sharpness(250.0, 100.0), QualityRating::Excellent);
    }
}
