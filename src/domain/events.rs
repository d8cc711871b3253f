//! Domain Events
//!
//! Per-frame occurrences broadcast in-process to the event log and any other
//! subscriber (§4.9 step 6, §6 Event log). This is internal fan-out only —
//! there is no network-visible endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::BoundingBox;

/// A domain event broadcast to in-process subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackEvent {
    /// A face was classified `Recognized(name)` this frame.
    Recognized(RecognizedEvent),
    /// A face was classified `Tracked(person_id)` this frame, whether newly
    /// admitted or re-observed.
    Tracked(TrackedEvent),
    /// An id's enrichment state transitioned.
    EnrichmentTransitioned(EnrichmentTransitionedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedEvent {
    pub source_id: String,
    pub frame_number: u64,
    pub name: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub source_id: String,
    pub frame_number: u64,
    pub person_id: String,
    pub newly_admitted: bool,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentTransitionedEvent {
    pub person_id: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl TrackEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TrackEvent::Recognized(e) => e.timestamp,
            TrackEvent::Tracked(e) => e.timestamp,
            TrackEvent::EnrichmentTransitioned(e) => e.timestamp,
        }
    }

    /// A coalescing key: events with the same key within the log interval
    /// collapse to one record (§6 Event log contract).
    pub fn coalesce_key(&self) -> String {
        match self {
            TrackEvent::Recognized(e) => format!("recognized:{}:{}", e.source_id, e.name),
            TrackEvent::Tracked(e) => format!("tracked:{}:{}", e.source_id, e.person_id),
            TrackEvent::EnrichmentTransitioned(e) => format!("enrichment:{}:{}", e.person_id, e.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(0, 0, 10, 10)
    }

    #[test]
    fn distinct_person_ids_have_distinct_coalesce_keys() {
        let a = TrackEvent::Tracked(TrackedEvent {
            source_id: "cam-1".into(),
            frame_number: 1,
            person_id: "person_001".into(),
            newly_admitted: true,
            confidence: 0.9,
            bounding_box: bbox(),
            timestamp: Utc::now(),
        });
        let b = TrackEvent::Tracked(TrackedEvent {
            source_id: "cam-1".into(),
            frame_number: 2,
            person_id: "person_002".into(),
            newly_admitted: true,
            confidence: 0.9,
            bounding_box: bbox(),
            timestamp: Utc::now(),
        });
        assert_ne!(a.coalesce_key(), b.coalesce_key());
    }

    #[test]
    fn repeated_sighting_of_same_id_shares_coalesce_key() {
        let a = TrackEvent::Tracked(TrackedEvent {
            source_id: "cam-1".into(),
            frame_number: 1,
            person_id: "person_001".into(),
            newly_admitted: true,
            confidence: 0.9,
            bounding_box: bbox(),
            timestamp: Utc::now(),
        });
        let b = TrackEvent::Tracked(TrackedEvent {
            source_id: "cam-1".into(),
            frame_number: 2,
            person_id: "person_001".into(),
            newly_admitted: false,
            confidence: 0.95,
            bounding_box: bbox(),
            timestamp: Utc::now(),
        });
        assert_eq!(a.coalesce_key(), b.coalesce_key());
    }
}
