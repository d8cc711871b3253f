//! Value Objects
//!
//! Immutable domain objects defined by their attributes rather than identity.

mod bounding_box;
mod face_embedding;

pub use bounding_box::*;
pub use face_embedding::*;
