//! Twelve Labs video indexing and analysis client.
//!
//! Endpoints used (all authenticated with an `x-api-key` header):
//!
//! - `POST /tasks` (multipart `index_id`, `video_file`) starts indexing.
//! - `GET /tasks/{id}` reports one task.
//! - `GET /tasks?video_id=..` lists the tasks of an indexed video.
//! - `POST /analyze` asks a free-text question about a video.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use vf_core::config::IndexingConfig;
use vf_core::{Error, Result, TaskId, VideoId};
use vf_pipeline::{AnalysisService, IndexingService, RemoteStatus, Upload};

use crate::http::{client, network, read_body};

pub struct TwelveLabsClient {
    http: Client,
    base_url: String,
    api_key: String,
    index_id: Option<String>,
    upload_timeout: Duration,
}

impl TwelveLabsClient {
    pub fn new(api_key: impl Into<String>, index_id: Option<String>) -> Self {
        Self::from_config(&IndexingConfig {
            api_key: Some(api_key.into()),
            index_id,
            ..IndexingConfig::default()
        })
    }

    pub fn from_config(config: &IndexingConfig) -> Self {
        Self {
            http: client(config.request_timeout()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            index_id: config.index_id.clone().filter(|id| !id.is_empty()),
            upload_timeout: config.upload_timeout(),
        }
    }

    /// Set custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "_id")]
    id: String,
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    status: String,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl From<TaskResponse> for RemoteStatus {
    fn from(task: TaskResponse) -> Self {
        let error = task.error.and_then(|e| match e {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        RemoteStatus {
            status: task.status,
            error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaskList {
    #[serde(default)]
    data: Vec<TaskResponse>,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    video_id: &'a str,
    prompt: &'a str,
    temperature: f32,
    stream: bool,
}

fn video_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Service impls
// ---------------------------------------------------------------------------

#[async_trait]
impl IndexingService for TwelveLabsClient {
    async fn submit(&self, video: &Path) -> Result<Upload> {
        let index_id = self
            .index_id
            .clone()
            .ok_or_else(|| Error::Validation("indexing index id is not configured".into()))?;

        let bytes = tokio::fs::read(video).await?;
        let file_name = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".into());
        tracing::info!(video = %video.display(), size = bytes.len(), "uploading video");

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(video_mime(video))
            .map_err(network)?;
        let form = Form::new().text("index_id", index_id).part("video_file", part);

        let resp = self
            .http
            .post(self.url("/tasks"))
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(network)?;

        let body = read_body(resp).await?;
        let upload: UploadResponse = serde_json::from_str(&body)?;
        Ok(Upload {
            task_id: TaskId::from(upload.id),
            video_id: VideoId::from(upload.video_id),
        })
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<RemoteStatus> {
        let resp = self
            .http
            .get(self.url(&format!("/tasks/{task_id}")))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(network)?;

        let body = read_body(resp).await?;
        let task: TaskResponse = serde_json::from_str(&body)?;
        Ok(task.into())
    }

    async fn resource_status(&self, video_id: &VideoId) -> Result<Option<RemoteStatus>> {
        let resp = self
            .http
            .get(self.url("/tasks"))
            .query(&[("video_id", video_id.as_str())])
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(network)?;

        let body = read_body(resp).await?;
        let list: TaskList = serde_json::from_str(&body)?;
        // The most recent task comes first.
        Ok(list.data.into_iter().next().map(RemoteStatus::from))
    }
}

#[async_trait]
impl AnalysisService for TwelveLabsClient {
    async fn analyze(&self, video_id: &VideoId, prompt: &str, temperature: f32) -> Result<String> {
        let request = AnalyzeRequest {
            video_id: video_id.as_str(),
            prompt,
            temperature,
            stream: false,
        };

        let resp = self
            .http
            .post(self.url("/analyze"))
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(network)?;

        read_body(resp).await
    }
}
