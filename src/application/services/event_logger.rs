//! Coalescing Event Logger
//!
//! Subscribes to the `EventBus` and writes append-only log records, but
//! collapses two consecutive identical events within the coalescing window
//! into one record (§6 Event log contract).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::application::services::EventBus;
use crate::domain::events::TrackEvent;

/// Runs the coalescing event log as a background task over an `EventBus`
/// subscription. Stops when the bus is dropped and the channel closes.
pub struct EventLogger {
    coalesce_window: Duration,
    last_emitted: HashMap<String, DateTime<Utc>>,
}

impl EventLogger {
    pub fn new(coalesce_window: Duration) -> Self {
        Self { coalesce_window, last_emitted: HashMap::new() }
    }

    /// Runs until the event bus has no more senders.
    pub async fn run(mut self, bus: EventBus) {
        let mut subscriber = bus.subscribe();
        while let Some(event) = subscriber.recv().await {
            self.log_if_not_coalesced(&event);
        }
    }

    /// Returns `true` if the event was written (not suppressed as a
    /// duplicate within the coalescing window).
    fn log_if_not_coalesced(&mut self, event: &TrackEvent) -> bool {
        let key = event.coalesce_key();
        let now = event.timestamp();

        if let Some(last) = self.last_emitted.get(&key) {
            let elapsed = now.signed_duration_since(*last);
            if elapsed.to_std().map(|d| d < self.coalesce_window).unwrap_or(true) {
                return false;
            }
        }

        self.last_emitted.insert(key, now);
        info!(event = ?event, "track event");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{RecognizedEvent, TrackedEvent};
    use crate::domain::value_objects::BoundingBox;

    fn tracked(person_id: &str, timestamp: DateTime<Utc>) -> TrackEvent {
        TrackEvent::Tracked(TrackedEvent {
            source_id: "cam-1".into(),
            frame_number: 1,
            person_id: person_id.into(),
            newly_admitted: false,
            confidence: 0.9,
            bounding_box: BoundingBox::new(0, 0, 10, 10),
            timestamp,
        })
    }

    fn recognized(name: &str, timestamp: DateTime<Utc>) -> TrackEvent {
        TrackEvent::Recognized(RecognizedEvent {
            source_id: "cam-1".into(),
            frame_number: 1,
            name: name.into(),
            confidence: 0.9,
            bounding_box: BoundingBox::new(0, 0, 10, 10),
            timestamp,
        })
    }

    #[test]
    fn first_occurrence_is_always_logged() {
        let mut logger = EventLogger::new(Duration::from_secs(5));
        assert!(logger.log_if_not_coalesced(&tracked("person_001", Utc::now())));
    }

    #[test]
    fn repeat_within_window_is_suppressed() {
        let mut logger = EventLogger::new(Duration::from_secs(5));
        let t0 = Utc::now();
        assert!(logger.log_if_not_coalesced(&tracked("person_001", t0)));
        assert!(!logger.log_if_not_coalesced(&tracked("person_001", t0 + chrono::Duration::seconds(1))));
    }

    #[test]
    fn repeat_after_window_is_logged_again() {
        let mut logger = EventLogger::new(Duration::from_secs(5));
        let t0 = Utc::now();
        assert!(logger.log_if_not_coalesced(&tracked("person_001", t0)));
        assert!(logger.log_if_not_coalesced(&tracked("person_001", t0 + chrono::Duration::seconds(10))));
    }

    #[test]
    fn distinct_events_do_not_suppress_each_other() {
        let mut logger = EventLogger::new(Duration::from_secs(5));
        let t0 = Utc::now();
        assert!(logger.log_if_not_coalesced(&tracked("person_001", t0)));
        assert!(logger.log_if_not_coalesced(&recognized("ada", t0)));
    }
}
