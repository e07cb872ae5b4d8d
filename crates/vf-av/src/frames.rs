//! Reference-frame extraction.
//!
//! The [`FrameExtractor`] trait turns a list of `MM:SS` timestamps into JPEG
//! stills. [`FfmpegFrameExtractor`] shells out to ffmpeg once per timestamp.
//! Failed timestamps are skipped; when nothing at all could be extracted a
//! single placeholder frame is produced so downstream stages always have an
//! image to work with.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;
use crate::tools::{ToolRegistry, FFMPEG};

/// File name of the fallback frame.
pub const PLACEHOLDER_FRAME: &str = "placeholder.jpg";

/// One image produced by frame extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFrame {
    /// Timestamp the frame was taken at; `None` for the placeholder frame.
    pub timestamp: Option<String>,
    pub path: PathBuf,
}

impl ExtractedFrame {
    pub fn is_placeholder(&self) -> bool {
        self.timestamp.is_none()
    }
}

/// Produces still images from a video at given timestamps.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Extract one frame per timestamp into `out_dir`.
    ///
    /// Implementations never fail because a single frame could not be
    /// produced; the returned list is non-empty unless `out_dir` itself is
    /// unusable.
    async fn extract(
        &self,
        video: &Path,
        timestamps: &[String],
        out_dir: &Path,
    ) -> vf_core::Result<Vec<ExtractedFrame>>;
}

/// Convert `MM:SS`, `HH:MM:SS` or plain-seconds text into seconds.
///
/// Anything unparseable (including `null`) maps to `0.0`, i.e. the first
/// frame of the video.
pub fn timestamp_to_seconds(timestamp: &str) -> f64 {
    let ts = timestamp.trim();
    if ts.is_empty() || ts == "null" {
        return 0.0;
    }

    let parts: Vec<&str> = ts.split(':').map(str::trim).collect();
    let parsed: Option<Vec<f64>> = parts.iter().map(|p| p.parse::<f64>().ok()).collect();

    match parsed.as_deref() {
        Some([secs]) => secs.max(0.0),
        Some([m, s]) => (m * 60.0 + s).max(0.0),
        Some([h, m, s]) => (h * 3600.0 + m * 60.0 + s).max(0.0),
        _ => {
            tracing::debug!(timestamp = ts, "unparseable timestamp; using 0s");
            0.0
        }
    }
}

/// ffmpeg-backed [`FrameExtractor`].
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    base: Option<ToolCommand>,
}

impl FfmpegFrameExtractor {
    /// Use the ffmpeg found in the registry. Without ffmpeg every extraction
    /// yields an empty placeholder file.
    pub fn from_registry(tools: &ToolRegistry) -> Self {
        match tools.require(FFMPEG) {
            Ok(cfg) => Self::from_command(cfg.command()),
            Err(e) => {
                tracing::warn!("{e}; frame extraction will only produce placeholders");
                Self { base: None }
            }
        }
    }

    /// Build on an arbitrary base invocation; extraction arguments are
    /// appended to it.
    pub fn from_command(base: ToolCommand) -> Self {
        Self { base: Some(base) }
    }

    fn frame_command(&self, video: &Path, seconds: f64, output: &Path) -> Option<ToolCommand> {
        let mut cmd = self.base.clone()?;
        cmd.arg("-i")
            .path_arg(video)
            .arg("-ss")
            .arg(seconds.to_string())
            .args(["-vframes", "1", "-q:v", "2", "-y"])
            .path_arg(output);
        Some(cmd)
    }

    fn placeholder_command(&self, output: &Path) -> Option<ToolCommand> {
        let mut cmd = self.base.clone()?;
        cmd.args(["-f", "lavfi", "-i", "color=c=red:size=640x480", "-vframes", "1", "-y"])
            .path_arg(output);
        Some(cmd)
    }

    async fn placeholder(&self, out_dir: &Path) -> vf_core::Result<ExtractedFrame> {
        let path = out_dir.join(PLACEHOLDER_FRAME);

        let rendered = match self.placeholder_command(&path) {
            Some(cmd) => match cmd.execute().await {
                Ok(_) => path.exists(),
                Err(e) => {
                    tracing::warn!("placeholder frame render failed: {e}");
                    false
                }
            },
            None => false,
        };

        if !rendered {
            tokio::fs::write(&path, b"").await?;
        }

        Ok(ExtractedFrame {
            timestamp: None,
            path,
        })
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract(
        &self,
        video: &Path,
        timestamps: &[String],
        out_dir: &Path,
    ) -> vf_core::Result<Vec<ExtractedFrame>> {
        tokio::fs::create_dir_all(out_dir).await?;

        let mut frames = Vec::with_capacity(timestamps.len());

        for (i, ts) in timestamps.iter().enumerate() {
            let seconds = timestamp_to_seconds(ts);
            let output = out_dir.join(format!("frame_{i:03}.jpg"));

            let Some(cmd) = self.frame_command(video, seconds, &output) else {
                break;
            };

            match cmd.execute().await {
                Ok(_) if output.exists() => {
                    tracing::debug!(timestamp = %ts, path = %output.display(), "frame extracted");
                    frames.push(ExtractedFrame {
                        timestamp: Some(ts.clone()),
                        path: output,
                    });
                }
                Ok(_) => {
                    tracing::warn!(timestamp = %ts, "ffmpeg succeeded but wrote no frame");
                }
                Err(e) => {
                    tracing::warn!(timestamp = %ts, "frame extraction failed: {e}");
                }
            }
        }

        if frames.is_empty() {
            tracing::warn!(
                requested = timestamps.len(),
                "no frames extracted; using placeholder"
            );
            frames.push(self.placeholder(out_dir).await?);
        }

        tracing::info!(count = frames.len(), "frame extraction finished");
        Ok(frames)
    }
}
