//! Tracker Core (C5)
//!
//! Combines the known set (C1), registry (C2), quality collector (C3), and
//! stability gate (C4) into the per-face decision procedure of §4.2. Owns
//! identifier allocation; the only component permitted to admit a new
//! `RegistryEntry`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::application::services::known_set::KnownSet;
use crate::application::services::quality_collector::QualityCollector;
use crate::application::services::stability_gate::{CandidateProbe, StabilityGate};
use crate::domain::entities::{RegistryEntry, TrackResult};
use crate::domain::ports::{Registry, RegistryError, StillsStore};
use crate::domain::value_objects::FaceEmbedding;

/// Tunable thresholds governing tracker behavior, mirroring §4.2–§4.4.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub tau_dup: f32,
    pub n_stability: u32,
    pub n_quality: usize,
    pub q_min: f32,
    pub enable_quality_check: bool,
    pub candidate_stale: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tau_dup: 0.45,
            n_stability: 5,
            n_quality: 5,
            q_min: 100.0,
            enable_quality_check: true,
            candidate_stale: Duration::seconds(2),
        }
    }
}

/// An upload handed off to the uploader pool at admission time (C6).
#[derive(Debug, Clone)]
pub struct AdmissionUpload {
    pub person_id: String,
    pub image_key: String,
    pub image_bytes: Vec<u8>,
}

/// The result of one `TrackerCore::step` call, plus whether this call is the
/// one that admitted the id (needed by the pipeline to decide whether an
/// enrichment task must be registered and an event emitted).
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub result: TrackResult,
    pub newly_admitted: bool,
    /// The `image_key` written to the registry, present only when
    /// `newly_admitted` is true; lets the caller register an enrichment task
    /// without recomputing the key.
    pub image_key: Option<String>,
}

impl StepOutcome {
    fn recognized(name: String) -> Self {
        Self { result: TrackResult::Recognized(name), newly_admitted: false, image_key: None }
    }
    fn tracked(id: String, newly_admitted: bool) -> Self {
        Self { result: TrackResult::Tracked(id), newly_admitted, image_key: None }
    }
    fn collecting() -> Self {
        Self { result: TrackResult::Collecting, newly_admitted: false, image_key: None }
    }
}

/// The per-face decision procedure (C5).
pub struct TrackerCore {
    known_set: Arc<KnownSet>,
    registry: Arc<dyn Registry>,
    stills: Arc<dyn StillsStore>,
    gate: Mutex<StabilityGate>,
    collector: Mutex<QualityCollector>,
    uploads: mpsc::UnboundedSender<AdmissionUpload>,
    config: TrackerConfig,
}

impl TrackerCore {
    pub fn new(
        known_set: Arc<KnownSet>,
        registry: Arc<dyn Registry>,
        stills: Arc<dyn StillsStore>,
        uploads: mpsc::UnboundedSender<AdmissionUpload>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            known_set,
            registry,
            stills,
            gate: Mutex::new(StabilityGate::new()),
            collector: Mutex::new(QualityCollector::new()),
            uploads,
            config,
        }
    }

    /// Runs the six-step decision procedure for one detected face.
    pub async fn step(
        &self,
        embedding: &FaceEmbedding,
        cropped_image: &[u8],
        sharpness: f32,
        now: DateTime<Utc>,
    ) -> Result<StepOutcome, RegistryError> {
        // Step 1: recognition probe.
        if let Some(known) = self.known_set.find_match(embedding).await {
            return Ok(StepOutcome::recognized(known.name));
        }

        // Step 2: registry probe (duplicate suppression).
        let reference_embeddings = self.registry.all_reference_embeddings().await;
        let nearest_registered = reference_embeddings
            .iter()
            .map(|(id, reference)| (id.clone(), reference.distance(embedding)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        if let Some((person_id, distance)) = nearest_registered {
            if distance <= self.config.tau_dup {
                self.registry.touch(&person_id, now).await?;
                return Ok(StepOutcome::tracked(person_id, false));
            }
        }

        // Step 3 + candidate eviction.
        let candidate_outcome = {
            let mut gate = self.gate.lock().await;
            gate.evict_stale(now, self.config.candidate_stale);
            gate.probe(embedding, self.config.tau_dup, self.config.n_stability, now)
        };

        // Step 4: stability gate.
        match candidate_outcome {
            CandidateProbe::NewCandidate { .. } | CandidateProbe::StillCollecting { .. } => {
                return Ok(StepOutcome::collecting());
            }
            CandidateProbe::ReachedStability { candidate_id } => {
                self.gate.lock().await.remove(&candidate_id);
            }
        };

        // Step 5: quality handoff.
        let n_quality = if self.config.enable_quality_check { self.config.n_quality } else { 1 };
        let (handle, ready) = {
            let mut collector = self.collector.lock().await;
            collector.evict_stale(now, self.config.candidate_stale);
            collector.offer(embedding, self.config.tau_dup, cropped_image.to_vec(), sharpness, n_quality, now)
        };
        if !ready {
            return Ok(StepOutcome::collecting());
        }
        let best = {
            let mut collector = self.collector.lock().await;
            collector.take_best(&handle)
        }
        .expect("a collection reported ready must have at least one frame");

        // Step 6: admission.
        let person_id = self.registry.allocate_id().await?;
        let image_key = format!("{}_{}.png", person_id, now.timestamp());
        let entry = RegistryEntry::new(
            person_id.clone(),
            image_key.clone(),
            best.sharpness,
            self.config.q_min,
            embedding.clone(),
            now,
        );
        self.registry.insert(entry).await?;

        if let Err(e) = self.stills.save(&image_key, &best.cropped_image).await {
            warn!(person_id = %person_id, image_key = %image_key, error = %e, "failed to write local still");
        }

        let _ = self.uploads.send(AdmissionUpload {
            person_id: person_id.clone(),
            image_key: image_key.clone(),
            image_bytes: best.cropped_image,
        });

        info!(person_id = %person_id, "admitted new identity");
        Ok(StepOutcome {
            result: TrackResult::Tracked(person_id),
            newly_admitted: true,
            image_key: Some(image_key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::EnrichmentState;
    use std::collections::HashMap;
    use tokio::sync::Mutex as TokioMutex;

    struct InMemoryRegistry {
        entries: TokioMutex<HashMap<String, RegistryEntry>>,
        next_ordinal: TokioMutex<u64>,
    }

    impl InMemoryRegistry {
        fn new() -> Self {
            Self {
                entries: TokioMutex::new(HashMap::new()),
                next_ordinal: TokioMutex::new(1),
            }
        }
    }

    #[async_trait::async_trait]
    impl Registry for InMemoryRegistry {
        async fn allocate_id(&self) -> Result<String, RegistryError> {
            let mut ordinal = self.next_ordinal.lock().await;
            let id = format!("person_{:03}", *ordinal);
            *ordinal += 1;
            Ok(id)
        }

        async fn insert(&self, entry: RegistryEntry) -> Result<(), RegistryError> {
            self.entries.lock().await.insert(entry.person_id.clone(), entry);
            Ok(())
        }

        async fn touch(&self, id: &str, now: DateTime<Utc>) -> Result<(), RegistryError> {
            if let Some(entry) = self.entries.lock().await.get_mut(id) {
                entry.touch(now);
            }
            Ok(())
        }

        async fn update_enrichment(&self, id: &str, new_state: EnrichmentState) -> Result<(), RegistryError> {
            if let Some(entry) = self.entries.lock().await.get_mut(id) {
                entry.apply_enrichment(new_state);
            }
            Ok(())
        }

        async fn update_remote_url(&self, id: &str, url: String) -> Result<(), RegistryError> {
            if let Some(entry) = self.entries.lock().await.get_mut(id) {
                entry.set_remote_url(url);
            }
            Ok(())
        }

        async fn all_reference_embeddings(&self) -> Vec<(String, FaceEmbedding)> {
            self.entries
                .lock()
                .await
                .values()
                .map(|e| (e.person_id.clone(), e.reference_embedding.clone()))
                .collect()
        }

        async fn get(&self, id: &str) -> Option<RegistryEntry> {
            self.entries.lock().await.get(id).cloned()
        }

        async fn save_to_disk(&self) -> Result<(), RegistryError> {
            Ok(())
        }
    }

    struct InMemoryStillsStore {
        saved: TokioMutex<HashMap<String, Vec<u8>>>,
    }

    impl InMemoryStillsStore {
        fn new() -> Self {
            Self { saved: TokioMutex::new(HashMap::new()) }
        }
    }

    #[async_trait::async_trait]
    impl StillsStore for InMemoryStillsStore {
        async fn save(&self, image_key: &str, bytes: &[u8]) -> crate::domain::ports::StillsResult<()> {
            self.saved.lock().await.insert(image_key.to_string(), bytes.to_vec());
            Ok(())
        }
    }

    fn embedding(value: f32) -> FaceEmbedding {
        FaceEmbedding::new(vec![value; 128])
    }

    fn tracker() -> (TrackerCore, mpsc::UnboundedReceiver<AdmissionUpload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let known_set = Arc::new(KnownSet::new(0.6));
        let registry: Arc<dyn Registry> = Arc::new(InMemoryRegistry::new());
        let stills: Arc<dyn StillsStore> = Arc::new(InMemoryStillsStore::new());
        let tracker = TrackerCore::new(known_set, registry, stills, tx, TrackerConfig::default());
        (tracker, rx)
    }

    #[tokio::test]
    async fn ten_consecutive_frames_admit_a_single_identity() {
        let (tracker, mut uploads) = tracker();
        let now = Utc::now();
        let mut last = StepOutcome::collecting();
        for i in 0..10 {
            last = tracker
                .step(&embedding(0.0), &[i as u8], 150.0, now + Duration::milliseconds(i))
                .await
                .unwrap();
        }
        assert!(matches!(last.result, TrackResult::Tracked(ref id) if id == "person_001"));
        assert!(last.newly_admitted);
        assert!(uploads.try_recv().is_ok());
    }

    #[tokio::test]
    async fn reappearance_within_threshold_is_tracked_not_recollected() {
        let (tracker, _uploads) = tracker();
        let now = Utc::now();
        for i in 0..10 {
            tracker.step(&embedding(0.0), &[0], 150.0, now + Duration::milliseconds(i)).await.unwrap();
        }
        let result = tracker.step(&embedding(0.02), &[0], 150.0, now + Duration::seconds(1)).await.unwrap();
        assert!(matches!(result.result, TrackResult::Tracked(ref id) if id == "person_001"));
        assert!(!result.newly_admitted);
    }

    #[tokio::test]
    async fn two_well_separated_faces_admit_two_identities() {
        let (tracker, _uploads) = tracker();
        let now = Utc::now();
        let mut last_a = StepOutcome::collecting();
        let mut last_b = StepOutcome::collecting();
        for i in 0..10 {
            last_a = tracker.step(&embedding(0.0), &[0], 150.0, now + Duration::milliseconds(i)).await.unwrap();
            last_b = tracker.step(&embedding(5.0), &[1], 150.0, now + Duration::milliseconds(i)).await.unwrap();
        }
        assert!(matches!(last_a.result, TrackResult::Tracked(ref id) if id == "person_001"));
        assert!(matches!(last_b.result, TrackResult::Tracked(ref id) if id == "person_002"));
    }

    #[tokio::test]
    async fn flicker_with_stale_gap_does_not_admit() {
        let (tracker, _uploads) = tracker();
        let now = Utc::now();
        for i in 0..3 {
            tracker.step(&embedding(0.0), &[0], 150.0, now + Duration::milliseconds(i)).await.unwrap();
        }
        let after_gap = now + Duration::seconds(3);
        let result = tracker.step(&embedding(0.0), &[0], 150.0, after_gap).await.unwrap();
        assert!(matches!(result.result, TrackResult::Collecting));
    }

    #[tokio::test]
    async fn low_sharpness_still_admits_with_downgraded_rating() {
        let (tracker, _uploads) = tracker();
        let now = Utc::now();
        let mut last = StepOutcome::collecting();
        for i in 0..10 {
            last = tracker.step(&embedding(0.0), &[0], 10.0, now + Duration::milliseconds(i)).await.unwrap();
        }
        assert!(matches!(last.result, TrackResult::Tracked(_)));
    }
}
