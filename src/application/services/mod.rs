//! Application Services
//!
//! Orchestration services for complex operations.

mod enrichment_worker;
mod event_bus;
mod event_logger;
mod known_set;
mod quality_collector;
mod stability_gate;
mod thumbnail_cache;
mod tracker_core;

pub use enrichment_worker::*;
pub use event_bus::*;
pub use event_logger::*;
pub use known_set::*;
pub use quality_collector::*;
pub use stability_gate::*;
pub use thumbnail_cache::*;
pub use tracker_core::*;
