//! # vf-pipeline
//!
//! Orchestration of the video to game pipeline.
//!
//! This crate provides:
//!
//! - **[`services`]** -- collaborator traits for the indexing, analysis and
//!   code-generation services (frame extraction and the geometry toolchain
//!   are re-exported from `vf-av`).
//! - **[`retry`]** -- the bounded retry combinator and [`Sleeper`] seam shared
//!   by the pollers and the query client.
//! - **[`poller`]** -- waiting for indexing tasks and video readiness.
//! - **[`QueryClient`]** -- analysis queries with exponential backoff, plus
//!   the [`envelope`] adapter that digs payloads out of answers.
//! - **[`JobStore`]** -- in-memory status / result / analysis records with a
//!   broadcast of every status change.
//! - **[`Orchestrator`]** -- runs a job through every stage, substituting
//!   [`placeholders`] when a generative step fails.

pub mod context;
pub mod envelope;
pub mod orchestrator;
pub mod placeholders;
pub mod poller;
pub mod prompts;
pub mod query;
pub mod retry;
pub mod services;
pub mod store;

// Re-export key types at the crate root.
pub use context::PipelineContext;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use query::QueryClient;
pub use retry::{retry, Attempt, RecordingSleeper, RetryError, RetryPolicy, Sleeper, TokioSleeper};
pub use services::{
    AnalysisService, CodeGenerator, ExtractedFrame, FrameExtractor, GeometryToolchain,
    IndexingService, RemoteState, RemoteStatus, Upload,
};
pub use store::{JobStore, StatusUpdate};
