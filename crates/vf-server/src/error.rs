//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; any [`vf_core::Error`]
//! converts with `?` and renders as a JSON `{error, code}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: vf_core::Error,
}

impl AppError {
    pub fn new(inner: vf_core::Error) -> Self {
        Self { inner }
    }
}

impl From<vf_core::Error> for AppError {
    fn from(e: vf_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
