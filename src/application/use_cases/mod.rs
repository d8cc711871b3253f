//! Use Cases
//!
//! Application-specific business rules and orchestration.

pub mod pipeline;

pub use pipeline::*;
