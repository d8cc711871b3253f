//! Face Tracker - Real-Time Identification & Enrichment Pipeline
//!
//! # Architecture
//!
//! This application follows Clean Architecture principles:
//! - **Domain**: Core business entities, ports, and rules
//! - **Application**: Use cases (the per-frame pipeline) and services (the
//!   tracker core and its collaborators)
//! - **Infrastructure**: External interfaces (registry file, object store,
//!   record store, configuration)
//!
//! # References
//!
//! - Clean Architecture: https://blog.cleancoder.com/uncle-bob/2012/08/13/the-clean-architecture.html
//! - SOLID Principles: https://en.wikipedia.org/wiki/SOLID

mod application;
mod domain;
mod infrastructure;

use anyhow::Result;
use chrono::Utc;
use infrastructure::config::PipelineConfig;
use infrastructure::runtime::PipelineRuntime;
use infrastructure::stub_collaborators::NullFrameSource;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::ports::FrameSource;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting face-tracker v{}", env!("CARGO_PKG_VERSION"));

    let config = PipelineConfig::load()?;
    let runtime = PipelineRuntime::bootstrap(&config).await?;

    let mut frame_source = NullFrameSource;
    run_capture_loop(&runtime, &mut frame_source).await;

    runtime.shutdown().await
}

/// Drives the per-frame pipeline from whatever `FrameSource` is plugged in.
/// Exits cleanly on Ctrl+C; a frame-source error just ends the loop, since
/// no production capture backend is mandated (§12).
async fn run_capture_loop(runtime: &PipelineRuntime, frame_source: &mut dyn FrameSource) {
    let mut frame_number = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                return;
            }
            frame = async { frame_source.next_frame() } => {
                match frame {
                    Some(frame) => {
                        if let Err(e) = runtime
                            .pipeline
                            .process_frame("default", frame_number, &frame, Utc::now())
                            .await
                        {
                            error!(error = %e, "frame processing failed");
                        }
                        frame_number += 1;
                    }
                    None => {
                        info!("frame source exhausted");
                        return;
                    }
                }
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "face_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
