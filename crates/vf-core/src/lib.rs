//! vf-core: shared types, IDs, errors, and configuration.
//!
//! This crate is the foundational dependency for all other vf-* crates,
//! providing typed identifiers, the unified error taxonomy of the pipeline,
//! the job/stage/angle domain model, and application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod job;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use job::*;
