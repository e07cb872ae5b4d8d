//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, the remote services, external tools and the
//! pipeline itself. Every section defaults sensibly so a completely empty
//! `{}` file is valid. Secrets are usually supplied through the environment
//! and merged with [`Config::apply_env`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// Environment variable holding the indexing/analysis service API key.
pub const ENV_INDEXING_API_KEY: &str = "TWL_API_KEY";
/// Environment variable holding the index the videos are uploaded into.
pub const ENV_INDEXING_INDEX_ID: &str = "TWL_INDEX_ID";
/// Environment variable holding the code-generation service API key.
pub const ENV_CODEGEN_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the data directory.
pub const ENV_DATA_DIR: &str = "VIDFORGE_DATA_DIR";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub indexing: IndexingConfig,
    pub codegen: CodegenConfig,
    pub tools: ToolsConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit (async, embedded, etc.).
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_INDEXING_API_KEY) {
            self.indexing.api_key = Some(key);
        }
        if let Some(index) = get(ENV_INDEXING_INDEX_ID) {
            self.indexing.index_id = Some(index);
        }
        if let Some(key) = get(ENV_CODEGEN_API_KEY) {
            self.codegen.api_key = Some(key);
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.server.data_dir = PathBuf::from(dir);
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.indexing.api_key.is_none() {
            warnings.push(format!(
                "indexing.api_key is not set (set {ENV_INDEXING_API_KEY}); uploads will fail"
            ));
        }
        if self.indexing.index_id.is_none() {
            warnings.push(format!(
                "indexing.index_id is not set (set {ENV_INDEXING_INDEX_ID}); uploads will fail"
            ));
        }
        if self.codegen.api_key.is_none() {
            warnings.push(format!(
                "codegen.api_key is not set (set {ENV_CODEGEN_API_KEY}); placeholders will be used"
            ));
        }

        let p = &self.pipeline;
        if p.task_poll_attempts == 0 {
            warnings.push("pipeline.task_poll_attempts is 0; every task wait will time out".into());
        }
        if p.readiness_poll_attempts == 0 {
            warnings.push(
                "pipeline.readiness_poll_attempts is 0; every readiness wait will time out".into(),
            );
        }
        if p.query_max_attempts == 0 {
            warnings.push("pipeline.query_max_attempts is 0; no query will be issued".into());
        }
        if p.query_backoff_multiplier < 1.0 {
            warnings.push(format!(
                "pipeline.query_backoff_multiplier {} is below 1.0; delays will shrink",
                p.query_backoff_multiplier
            ));
        }
        if p.query_max_delay_secs < p.query_initial_delay_secs {
            warnings.push(
                "pipeline.query_max_delay_secs is below query_initial_delay_secs".into(),
            );
        }
        if p.default_frame_timestamps.is_empty() {
            warnings.push(
                "pipeline.default_frame_timestamps is empty; runs without timestamps extract no frames"
                    .into(),
            );
        }
        if p.skip_polling {
            warnings.push(
                "pipeline.skip_polling is enabled; queries may hit a video that is not indexed"
                    .into(),
            );
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings and on-disk layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Where uploaded videos are written.
    pub upload_dir: PathBuf,
    /// Root for generated artifacts (`models/` and `screenshots/`).
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            upload_dir: PathBuf::from("uploads"),
            data_dir: PathBuf::from("uploads"),
        }
    }
}

impl ServerConfig {
    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.data_dir.join("screenshots")
    }
}

/// Remote indexing and analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub index_id: Option<String>,
    /// Timeout for ordinary JSON requests.
    pub request_timeout_secs: u64,
    /// Timeout for the multipart video upload.
    pub upload_timeout_secs: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twelvelabs.io/v1.3".into(),
            api_key: None,
            index_id: None,
            request_timeout_secs: 60,
            upload_timeout_secs: 600,
        }
    }
}

impl IndexingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

/// Code-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            model: "gpt-4o".into(),
            max_tokens: 4000,
            temperature: 0.7,
            request_timeout_secs: 120,
        }
    }
}

impl CodegenConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub openscad_path: Option<PathBuf>,
    pub blender_path: Option<PathBuf>,
    /// Upper bound for a single tool invocation.
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            openscad_path: None,
            blender_path: None,
            timeout_secs: 300,
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Polling, retry and fallback settings for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub task_poll_interval_secs: u64,
    pub task_poll_attempts: u32,
    pub readiness_poll_interval_secs: u64,
    pub readiness_poll_attempts: u32,
    pub query_max_attempts: u32,
    pub query_initial_delay_secs: f64,
    pub query_backoff_multiplier: f64,
    pub query_max_delay_secs: f64,
    /// Pause between consecutive angle queries; 0 disables pacing.
    pub angle_pacing_ms: u64,
    /// Skip both pollers and query the video straight after upload.
    pub skip_polling: bool,
    /// Frames extracted when no angle produced a timestamp.
    pub default_frame_timestamps: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            task_poll_interval_secs: 3,
            task_poll_attempts: 100,
            readiness_poll_interval_secs: 3,
            readiness_poll_attempts: 60,
            query_max_attempts: 10,
            query_initial_delay_secs: 3.0,
            query_backoff_multiplier: 1.5,
            query_max_delay_secs: 30.0,
            angle_pacing_ms: 500,
            skip_polling: false,
            default_frame_timestamps: vec!["00:01".into(), "00:03".into(), "00:05".into()],
        }
    }
}

impl PipelineConfig {
    pub fn task_poll_interval(&self) -> Duration {
        Duration::from_secs(self.task_poll_interval_secs)
    }

    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_secs(self.readiness_poll_interval_secs)
    }

    pub fn query_initial_delay(&self) -> Duration {
        Duration::from_secs_f64(self.query_initial_delay_secs.max(0.0))
    }

    pub fn query_max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.query_max_delay_secs.max(0.0))
    }

    pub fn angle_pacing(&self) -> Duration {
        Duration::from_millis(self.angle_pacing_ms)
    }
}
