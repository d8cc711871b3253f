//! Composition Root
//!
//! Wires every component (C1–C9) together from a `PipelineConfig`, in the
//! same bottom-up order an `AppState::new` assembles its repositories and
//! services.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Duration as ChronoDuration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::application::services::{
    AdmissionUpload, EnrichmentWorker, EventBus, EventLogger, KnownSet, ReqwestThumbnailFetcher, ThumbnailCache,
    TrackerConfig, TrackerCore,
};
use crate::application::use_cases::Pipeline;
use crate::domain::ports::{FaceDetector, FaceEmbedder, FrameCropper, Registry, SharpnessMetric, StillsStore};
use crate::infrastructure::config::PipelineConfig;
use crate::infrastructure::known_set_loader::{load_known_set, ImageDecoder};
use crate::infrastructure::object_store::{S3Config, S3ObjectStoreClient};
use crate::infrastructure::record_store::HttpRecordStore;
use crate::infrastructure::registry::JsonRegistry;
use crate::infrastructure::stills_store::FsStillsStore;
use crate::infrastructure::stub_collaborators::{
    ByteVarianceSharpness, NullFaceDetector, PassthroughCropper, ZeroFaceEmbedder,
};

/// Bound on how long shutdown waits for the upload consumer to drain
/// in-flight uploads before falling back to aborting it.
const UPLOAD_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the per-frame loop needs. `main` owns a `FrameSource` and
/// drives `pipeline.process_frame` for each captured frame.
pub struct PipelineRuntime {
    pub pipeline: Pipeline,
    pub event_bus: EventBus,
    pub registry: Arc<dyn Registry>,
    pub known_set: Arc<KnownSet>,
    pub thumbnail_cache: Arc<ThumbnailCache>,
    upload_task: tokio::task::JoinHandle<()>,
}

impl PipelineRuntime {
    /// Builds every collaborator from `config` and assembles the pipeline.
    /// Detector/embedder/cropper/sharpness default to the stub collaborators
    /// (§12) unless overridden with `with_collaborators`.
    pub async fn bootstrap(config: &PipelineConfig) -> Result<Self> {
        Self::bootstrap_with(
            config,
            Arc::new(NullFaceDetector),
            Arc::new(ZeroFaceEmbedder),
            Arc::new(PassthroughCropper),
            Arc::new(ByteVarianceSharpness),
        )
        .await
    }

    pub async fn bootstrap_with(
        config: &PipelineConfig,
        detector: Arc<dyn FaceDetector>,
        embedder: Arc<dyn FaceEmbedder>,
        cropper: Arc<dyn FrameCropper>,
        sharpness_metric: Arc<dyn SharpnessMetric>,
    ) -> Result<Self> {
        let registry: Arc<dyn Registry> =
            Arc::new(JsonRegistry::open(&config.registry_path).await.context("opening registry")?);

        let known_set = Arc::new(KnownSet::new(config.tau_recog));
        if config.known_faces_dir.is_dir() {
            match load_known_set(
                &config.known_faces_dir,
                &RawBytesDecoder,
                detector.as_ref(),
                embedder.as_ref(),
                known_set.clone(),
            )
            .await
            {
                Ok(loaded) => info!(loaded, "known set loaded at startup"),
                Err(e) => warn!(error = %e, "failed to load known set, starting empty"),
            }
        } else {
            warn!(dir = %config.known_faces_dir.display(), "known faces directory absent, starting with an empty known set");
        }

        let object_store = S3ObjectStoreClient::new(S3Config {
            endpoint_url: config.object_store_endpoint_url.clone(),
            access_key_id: config.object_store_access_key_id.clone(),
            secret_access_key: config.object_store_secret_access_key.clone(),
            bucket_name: config.object_store_bucket.clone(),
            region: config.object_store_region.clone(),
            public_base_url: config.object_store_public_base_url.clone(),
        })
        .await
        .context("constructing object store client")?;

        let record_store =
            Arc::new(HttpRecordStore::new(config.record_store_base_url.clone()).context("constructing record store client")?);

        let (uploads_tx, uploads_rx) = mpsc::unbounded_channel();
        let upload_task =
            spawn_upload_consumer(uploads_rx, object_store, config.object_store_prefix.clone(), registry.clone());

        let stills: Arc<dyn StillsStore> = Arc::new(FsStillsStore::new(config.stills_dir.clone()));

        let tracker_config = TrackerConfig {
            tau_dup: config.tau_dup,
            n_stability: config.n_stability as u32,
            n_quality: config.n_quality,
            q_min: config.q_min,
            enable_quality_check: config.enable_quality_check,
            candidate_stale: ChronoDuration::seconds(config.t_candidate_stale_secs as i64),
        };
        let tracker =
            Arc::new(TrackerCore::new(known_set.clone(), registry.clone(), stills, uploads_tx, tracker_config));

        let enrichment_worker = Arc::new(EnrichmentWorker::new(
            registry.clone(),
            record_store,
            Duration::from_secs(config.t_poll_secs),
            Duration::from_secs(config.t_poll_max_secs),
        ));

        let thumbnail_cache = Arc::new(ThumbnailCache::new(
            Arc::new(ReqwestThumbnailFetcher::new()),
            Duration::from_secs(config.thumbnail_fetch_timeout_secs),
        ));

        let event_bus = EventBus::new();
        let pipeline = Pipeline::new(detector, embedder, cropper, sharpness_metric, tracker, enrichment_worker, event_bus.clone());

        let logger = EventLogger::new(Duration::from_secs(3));
        tokio::spawn(logger.run(event_bus.clone()));

        Ok(Self { pipeline, event_bus, registry, known_set, thumbnail_cache, upload_task })
    }

    /// Persists the registry and stops background tasks started by bootstrap.
    ///
    /// Dropping `pipeline` drops the tracker core's upload sender, which
    /// closes the channel the upload consumer reads from; the consumer then
    /// drains any in-flight uploads and exits on its own. Only if it fails
    /// to do so within `UPLOAD_DRAIN_TIMEOUT` is it aborted outright.
    pub async fn shutdown(self) -> Result<()> {
        self.registry.save_to_disk().await.context("persisting registry on shutdown")?;

        let mut upload_task = self.upload_task;
        drop(self.pipeline);

        match tokio::time::timeout(UPLOAD_DRAIN_TIMEOUT, &mut upload_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "upload consumer task panicked during shutdown"),
            Err(_) => {
                warn!("upload consumer did not drain in time, aborting");
                upload_task.abort();
            }
        }

        Ok(())
    }
}

/// Minimal `FaceDetector`/`FaceEmbedder`-compatible decoder used only to
/// seed the known set: treats the raw file bytes as already-decoded pixels.
struct RawBytesDecoder;
impl ImageDecoder for RawBytesDecoder {
    fn decode(&self, bytes: &[u8]) -> Option<crate::domain::ports::Frame> {
        if bytes.is_empty() {
            None
        } else {
            Some(crate::domain::ports::Frame { width: 0, height: 0, pixels: bytes.to_vec() })
        }
    }
}

fn spawn_upload_consumer(
    mut uploads_rx: mpsc::UnboundedReceiver<AdmissionUpload>,
    object_store: S3ObjectStoreClient,
    prefix: String,
    registry: Arc<dyn Registry>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(upload) = uploads_rx.recv().await {
            let key = format!("{}/{}", prefix.trim_end_matches('/'), upload.image_key);
            match crate::domain::ports::ObjectStoreClient::upload(&object_store, &key, upload.image_bytes, "image/png")
                .await
            {
                Ok(url) => {
                    info!(person_id = %upload.person_id, url = %url, "uploaded still");
                    if let Err(e) = registry.update_remote_url(&upload.person_id, url).await {
                        warn!(person_id = %upload.person_id, error = %e, "failed to record remote url");
                    }
                }
                Err(e) => warn!(person_id = %upload.person_id, error = %e, "still upload failed"),
            }
        }
    })
}
