//! Response handling shared by both clients.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use vf_core::Error;

/// Longest response body kept in an error.
const MAX_ERROR_BODY: usize = 500;

/// Error code the analysis service uses for videos that cannot be queried yet.
pub(crate) const NOT_READY_CODE: &str = "video_not_ready";

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    message: Option<String>,
}

/// Build a client with a default request timeout, falling back to the plain
/// client if the builder fails.
pub(crate) fn client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::warn!("Failed to build HTTP client with timeout: {e}");
        Client::new()
    })
}

pub(crate) fn network(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

/// Read the body of `resp`, turning non-success statuses into errors.
pub(crate) async fn read_body(resp: Response) -> vf_core::Result<String> {
    let status = resp.status();
    let body = resp.text().await.map_err(network)?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(status_error(status, body))
    }
}

/// Map a non-success response to an error; a 400 carrying the not-ready code
/// becomes [`Error::NotReady`].
pub(crate) fn status_error(status: StatusCode, body: String) -> Error {
    if status == StatusCode::BAD_REQUEST {
        if let Ok(api) = serde_json::from_str::<ApiError>(&body) {
            if api.code.as_deref() == Some(NOT_READY_CODE) {
                return Error::NotReady(api.message.unwrap_or_else(|| NOT_READY_CODE.into()));
            }
        }
    }
    Error::remote(status.as_u16(), truncate(body))
}

fn truncate(body: String) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        body
    } else {
        let mut short: String = body.chars().take(MAX_ERROR_BODY).collect();
        short.push_str("...");
        short
    }
}
