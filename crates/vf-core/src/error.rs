//! Unified error type for the vidforge pipeline.
//!
//! All crates funnel their failures into [`Error`]. The variants mirror the
//! failure taxonomy of the orchestrator: fatal remote failures
//! ([`Error::TaskFailed`], [`Error::PollingTimeout`], [`Error::QueryExhausted`]),
//! retryable conditions ([`Error::NotReady`], [`Error::Network`]) and locally
//! recovered tool failures ([`Error::Tool`]). API handlers derive an HTTP
//! status code via [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in vidforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote indexing task explicitly reported a failure.
    #[error("Task {task_id} failed: {message}")]
    TaskFailed {
        /// Remote task (or resource) identifier.
        task_id: String,
        /// Error text reported by the remote service.
        message: String,
    },

    /// A bounded polling loop ran out of attempts.
    #[error("Timed out waiting for {what} after {attempts} attempts")]
    PollingTimeout {
        /// What was being waited on (e.g. "task 64c9...").
        what: String,
        /// Number of polls performed.
        attempts: u32,
    },

    /// A retried query used up its attempt budget.
    #[error("Query failed after {attempts} attempts: {message}")]
    QueryExhausted {
        /// Number of attempts performed.
        attempts: u32,
        /// Reason reported by the last attempt.
        message: String,
    },

    /// The analysis service answered that the resource is not queryable yet.
    #[error("Resource not ready: {0}")]
    NotReady(String),

    /// An external tool (ffmpeg, openscad, blender) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// A transport-level failure talking to a remote service.
    #[error("Network error: {0}")]
    Network(String),

    /// A remote service answered with a non-success status.
    #[error("Remote service returned {status}: {body}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Response body (possibly truncated).
        body: String,
    },

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "job", "video file").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Input or configuration failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serde_json error.
        #[from]
        source: serde_json::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::TaskFailed { .. } => 502,
            Error::PollingTimeout { .. } => 504,
            Error::QueryExhausted { .. } => 504,
            Error::NotReady(_) => 503,
            Error::Tool { .. } => 502,
            Error::Network(_) => 502,
            Error::Remote { .. } => 502,
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Io { .. } => 500,
            Error::Json { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Whether a retry loop with attempts left should try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NotReady(_) | Error::Network(_))
    }

    /// Short machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::TaskFailed { .. } => "task_failed",
            Error::PollingTimeout { .. } => "polling_timeout",
            Error::QueryExhausted { .. } => "query_exhausted",
            Error::NotReady(_) => "not_ready",
            Error::Tool { .. } => "tool_error",
            Error::Network(_) => "network_error",
            Error::Remote { .. } => "remote_error",
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::Io { .. } => "io_error",
            Error::Json { .. } => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::TaskFailed`].
    pub fn task_failed(task_id: impl fmt::Display, message: impl Into<String>) -> Self {
        Error::TaskFailed {
            task_id: task_id.to_string(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Remote`].
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Error::Remote {
            status,
            body: body.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
