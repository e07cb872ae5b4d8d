//! Collaborator interfaces consumed by the orchestrator.
//!
//! Each remote or local capability the pipeline depends on is a narrow
//! `async_trait` so the orchestrator can be driven by real clients in
//! production and by in-memory fakes in tests. Frame extraction and the
//! geometry toolchain live in `vf-av` and are re-exported here.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vf_core::{Result, TaskId, VideoId};

pub use vf_av::{ExtractedFrame, FrameExtractor, GeometryToolchain};

/// Identifiers returned by a successful video submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub task_id: TaskId,
    pub video_id: VideoId,
}

/// Coarse classification of a remote status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Pending,
    Succeeded,
    Failed,
    Unknown,
}

/// Status of a remote task or resource as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemoteStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: "failed".into(),
            error: Some(error.into()),
        }
    }

    pub fn state(&self) -> RemoteState {
        match self.status.trim().to_ascii_lowercase().as_str() {
            "pending" | "processing" | "uploading" | "queued" | "video_not_ready"
            | "indexing" | "validating" => RemoteState::Pending,
            "completed" | "ready" => RemoteState::Succeeded,
            "failed" => RemoteState::Failed,
            _ => RemoteState::Unknown,
        }
    }

    /// Error text for a failed status, defaulting when the service gave none.
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// Remote video indexing service.
#[async_trait]
pub trait IndexingService: Send + Sync {
    /// Upload a local video and start indexing it.
    async fn submit(&self, video: &Path) -> Result<Upload>;

    /// Current status of an indexing task.
    async fn task_status(&self, task_id: &TaskId) -> Result<RemoteStatus>;

    /// Current status of an indexed video; `None` while the service has no
    /// record of it yet.
    async fn resource_status(&self, video_id: &VideoId) -> Result<Option<RemoteStatus>>;
}

/// Vision-language analysis over an indexed video.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Ask a free-text question about the video and return the raw answer.
    ///
    /// Returns [`vf_core::Error::NotReady`] while the video cannot be queried
    /// yet.
    async fn analyze(&self, video_id: &VideoId, prompt: &str, temperature: f32) -> Result<String>;
}

/// Text (and optionally vision) code generation.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate text for `prompt`, showing the model `images` when given.
    async fn generate(&self, prompt: &str, images: &[PathBuf]) -> Result<String>;
}
