//! vf-clients: HTTP clients for the remote services behind the pipeline.
//!
//! - [`TwelveLabsClient`] implements both
//!   [`IndexingService`](vf_pipeline::IndexingService) and
//!   [`AnalysisService`](vf_pipeline::AnalysisService).
//! - [`OpenAiClient`] implements [`CodeGenerator`](vf_pipeline::CodeGenerator)
//!   over the chat completions API.
//!
//! Transport failures map to [`vf_core::Error::Network`] and non-success
//! responses to [`vf_core::Error::Remote`], so the pipeline's retry logic can
//! tell them apart.

mod http;
pub mod openai;
pub mod twelve_labs;

pub use openai::OpenAiClient;
pub use twelve_labs::TwelveLabsClient;
