//! Domain Entities
//!
//! Core business objects with identity and lifecycle.

mod detected_face;
mod detection_candidate;
mod enrichment_state;
mod known_identity;
mod quality_collection;
mod registry_entry;
mod track_result;

pub use detected_face::*;
pub use detection_candidate::*;
pub use enrichment_state::*;
pub use known_identity::*;
pub use quality_collection::*;
pub use registry_entry::*;
pub use track_result::*;
