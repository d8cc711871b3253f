//! Per-Frame Pipeline (C9)
//!
//! For each captured frame: detect, embed, score sharpness, run the tracker
//! core per face in detection order, and emit a coalesced event for any
//! detection whose classification changed. Overlay rendering reads only C2
//! and C8 and is never blocked on C6 or C7 (§4.9).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::services::{EnrichmentWorker, EventBus, StepOutcome, TrackerCore};
use crate::domain::entities::{DetectedFace, FrameDetections, TrackResult};
use crate::domain::events::{RecognizedEvent, TrackedEvent, TrackEvent};
use crate::domain::ports::{FaceDetector, FaceEmbedder, Frame, FrameCropper, RegistryError, SharpnessMetric};

/// Composes the external detector/embedder/cropper/sharpness collaborators
/// with the tracker core into the per-frame orchestration loop.
pub struct Pipeline {
    detector: Arc<dyn FaceDetector>,
    embedder: Arc<dyn FaceEmbedder>,
    cropper: Arc<dyn FrameCropper>,
    sharpness_metric: Arc<dyn SharpnessMetric>,
    tracker: Arc<TrackerCore>,
    enrichment_worker: Arc<EnrichmentWorker>,
    event_bus: EventBus,
}

/// Summary of one `process_frame` call, for logging/metrics at the caller.
#[derive(Debug, Default)]
pub struct FrameOutcome {
    pub face_count: usize,
    pub results: Vec<TrackResult>,
}

impl Pipeline {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        embedder: Arc<dyn FaceEmbedder>,
        cropper: Arc<dyn FrameCropper>,
        sharpness_metric: Arc<dyn SharpnessMetric>,
        tracker: Arc<TrackerCore>,
        enrichment_worker: Arc<EnrichmentWorker>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            detector,
            embedder,
            cropper,
            sharpness_metric,
            tracker,
            enrichment_worker,
            event_bus,
        }
    }

    /// Runs detection, embedding, sharpness scoring, and tracking for one
    /// captured frame, in detector-returned order.
    pub async fn process_frame(
        &self,
        source_id: &str,
        frame_number: u64,
        frame: &Frame,
        now: DateTime<Utc>,
    ) -> Result<FrameOutcome, RegistryError> {
        let mut detections = FrameDetections::new(source_id, frame_number, now.timestamp_millis());
        for bounding_box in self.detector.detect(frame) {
            let cropped_image = self.cropper.crop(frame, &bounding_box);
            let embedding = self.embedder.embed(frame, &bounding_box);
            let sharpness = self.sharpness_metric.sharpness(&cropped_image);

            let mut face = DetectedFace::new(bounding_box, 1.0);
            face.set_embedding(embedding);
            face.set_cropped_image(cropped_image);
            face.set_sharpness(sharpness);
            detections.add_face(face);
        }

        let mut results = Vec::with_capacity(detections.face_count());
        for face in detections.faces() {
            let outcome = self
                .tracker
                .step(
                    face.embedding().expect("set during the detection pass above"),
                    face.cropped_image().expect("set during the detection pass above"),
                    face.sharpness().expect("set during the detection pass above"),
                    now,
                )
                .await?;

            self.emit_if_classified(source_id, frame_number, face, &outcome, now);
            results.push(outcome.result);
        }

        Ok(FrameOutcome { face_count: detections.face_count(), results })
    }

    /// Emits a `TrackEvent` for any face that resolved to `Recognized` or
    /// `Tracked` this frame, and registers an enrichment task on admission
    /// (§4.9 step 6).
    fn emit_if_classified(
        &self,
        source_id: &str,
        frame_number: u64,
        face: &DetectedFace,
        outcome: &StepOutcome,
        now: DateTime<Utc>,
    ) {
        match &outcome.result {
            TrackResult::Recognized(name) => {
                self.event_bus.publish(TrackEvent::Recognized(RecognizedEvent {
                    source_id: source_id.to_string(),
                    frame_number,
                    name: name.clone(),
                    confidence: face.confidence(),
                    bounding_box: face.bounding_box().clone(),
                    timestamp: now,
                }));
            }
            TrackResult::Tracked(person_id) => {
                if outcome.newly_admitted {
                    if let Some(image_key) = &outcome.image_key {
                        self.enrichment_worker.spawn(person_id.clone(), image_key.clone());
                    }
                }
                self.event_bus.publish(TrackEvent::Tracked(TrackedEvent {
                    source_id: source_id.to_string(),
                    frame_number,
                    person_id: person_id.clone(),
                    newly_admitted: outcome.newly_admitted,
                    confidence: face.confidence(),
                    bounding_box: face.bounding_box().clone(),
                    timestamp: now,
                }));
            }
            TrackResult::Collecting | TrackResult::Suppressed => {}
        }
    }
}
