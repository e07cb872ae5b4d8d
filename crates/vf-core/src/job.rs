//! Domain model for pipeline jobs: stages, angles, status snapshots, and the
//! analysis / run results produced by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::ids::{JobId, TaskId, VideoId};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Pipeline stage of a job.
///
/// The healthy stages are strictly ordered (see [`Stage::PIPELINE`]) and each
/// carries a fixed progress percentage. `Error` is the terminal failure stage
/// and `Unknown` is only ever reported for job ids the store has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Unknown,
    Starting,
    Uploading,
    Analyzing,
    ExtractingFrames,
    GeneratingGeometryCode,
    GeneratingConcept,
    ConvertingModel,
    GeneratingAssetCode,
    Completed,
    Error,
}

impl Stage {
    /// Healthy stages in execution order.
    pub const PIPELINE: [Stage; 9] = [
        Stage::Starting,
        Stage::Uploading,
        Stage::Analyzing,
        Stage::ExtractingFrames,
        Stage::GeneratingGeometryCode,
        Stage::GeneratingConcept,
        Stage::ConvertingModel,
        Stage::GeneratingAssetCode,
        Stage::Completed,
    ];

    /// Progress percentage reported when the stage begins.
    pub fn percent(self) -> u8 {
        match self {
            Stage::Unknown => 0,
            Stage::Starting => 0,
            Stage::Uploading => 5,
            Stage::Analyzing => 15,
            Stage::ExtractingFrames => 25,
            Stage::GeneratingGeometryCode => 40,
            Stage::GeneratingConcept => 55,
            Stage::ConvertingModel => 70,
            Stage::GeneratingAssetCode => 85,
            Stage::Completed => 100,
            Stage::Error => 0,
        }
    }

    /// Human-readable message shown to status-polling clients.
    pub fn message(self) -> &'static str {
        match self {
            Stage::Unknown => "Job not found",
            Stage::Starting => "Starting video processing...",
            Stage::Uploading => "Uploading video to the indexing service...",
            Stage::Analyzing => "Analyzing video...",
            Stage::ExtractingFrames => "Extracting key frames...",
            Stage::GeneratingGeometryCode => "Generating 3D model code...",
            Stage::GeneratingConcept => "Creating game concept...",
            Stage::ConvertingModel => "Converting 3D model...",
            Stage::GeneratingAssetCode => "Building interactive game...",
            Stage::Completed => "Game ready!",
            Stage::Error => "Processing failed",
        }
    }

    /// Wire name of the stage.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Unknown => "unknown",
            Stage::Starting => "starting",
            Stage::Uploading => "uploading",
            Stage::Analyzing => "analyzing",
            Stage::ExtractingFrames => "extracting_frames",
            Stage::GeneratingGeometryCode => "generating_geometry_code",
            Stage::GeneratingConcept => "generating_concept",
            Stage::ConvertingModel => "converting_model",
            Stage::GeneratingAssetCode => "generating_asset_code",
            Stage::Completed => "completed",
            Stage::Error => "error",
        }
    }

    /// Whether no further transition can happen from this stage.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Error)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Angle
// ---------------------------------------------------------------------------

/// One of the four canonical viewpoints of the filmed object.
///
/// `Ord` follows the canonical order front, side, back, top, which is also the
/// order timestamps are flattened in for frame extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Angle {
    Front,
    Side,
    Back,
    Top,
}

impl Angle {
    /// All angles in canonical order.
    pub const ALL: [Angle; 4] = [Angle::Front, Angle::Side, Angle::Back, Angle::Top];

    pub fn as_str(self) -> &'static str {
        match self {
            Angle::Front => "front",
            Angle::Side => "side",
            Angle::Back => "back",
            Angle::Top => "top",
        }
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best timestamp per angle (`None` when the query failed or found nothing).
pub type AngleTimestamps = BTreeMap<Angle, Option<String>>;

/// Screenshot path per angle, only for angles that produced a frame.
pub type AngleScreenshots = BTreeMap<Angle, PathBuf>;

/// Flatten the present timestamps in canonical angle order.
pub fn present_timestamps(timestamps: &AngleTimestamps) -> Vec<String> {
    Angle::ALL
        .iter()
        .filter_map(|angle| timestamps.get(angle).cloned().flatten())
        .collect()
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Snapshot of a job's progress as seen by status-polling clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub stage: Stage,
    pub percent: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    /// Status reported for ids the store has never seen.
    pub fn unknown() -> Self {
        Self {
            stage: Stage::Unknown,
            percent: 0,
            message: Stage::Unknown.message().to_string(),
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Status at the beginning of a healthy stage.
    pub fn at(stage: Stage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
            message: stage.message().to_string(),
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Terminal failure status carrying the error text.
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            stage: Stage::Error,
            percent: 0,
            message: format!("Processing failed: {error}"),
            error: Some(error),
            updated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// Terminal state of an analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Completed,
    Failed,
}

/// Outcome of the analysis stage for one remote indexing task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub task_id: TaskId,
    pub video_id: VideoId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timestamps: AngleTimestamps,
    #[serde(default)]
    pub screenshots: AngleScreenshots,
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn completed(
        task_id: TaskId,
        video_id: VideoId,
        description: String,
        timestamps: AngleTimestamps,
    ) -> Self {
        Self {
            task_id,
            video_id,
            description,
            timestamps,
            screenshots: AngleScreenshots::new(),
            status: AnalysisStatus::Completed,
            error: None,
        }
    }

    pub fn failed(task_id: TaskId, video_id: VideoId, error: impl Into<String>) -> Self {
        Self {
            task_id,
            video_id,
            description: String::new(),
            timestamps: AngleTimestamps::new(),
            screenshots: AngleScreenshots::new(),
            status: AnalysisStatus::Failed,
            error: Some(error.into()),
        }
    }

    /// Number of angles that produced a timestamp.
    pub fn angles_found(&self) -> usize {
        self.timestamps.values().filter(|t| t.is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// PipelineRunResult
// ---------------------------------------------------------------------------

/// Terminal aggregate of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRunResult {
    pub job_id: JobId,
    pub video_id: VideoId,
    pub task_id: TaskId,
    pub object_description: String,
    pub timestamps: AngleTimestamps,
    pub screenshots: AngleScreenshots,
    /// Every reference image produced by frame extraction, in order.
    pub frames: Vec<PathBuf>,
    /// OpenSCAD source describing the object's geometry.
    pub geometry_code: String,
    /// Free-text game concept built around the object.
    pub game_concept: String,
    /// URL of the converted GLB mesh (or the placeholder asset).
    pub model_url: String,
    /// Self-contained HTML/JS source of the generated game.
    pub asset_source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_percent_is_non_decreasing() {
        let percents: Vec<u8> = Stage::PIPELINE.iter().map(|s| s.percent()).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
    }

    #[test]
    fn stage_serializes_snake_case() {
        let json = serde_json::to_string(&Stage::GeneratingGeometryCode).unwrap();
        assert_eq!(json, "\"generating_geometry_code\"");
        for stage in Stage::PIPELINE {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Completed.is_terminal());
        assert!(Stage::Error.is_terminal());
        assert!(!Stage::Analyzing.is_terminal());
    }

    #[test]
    fn unknown_status_defaults() {
        let status = JobStatus::unknown();
        assert_eq!(status.stage, Stage::Unknown);
        assert_eq!(status.percent, 0);
        assert_eq!(status.message, "Job not found");
        assert!(status.error.is_none());
    }

    #[test]
    fn failed_status_carries_error() {
        let status = JobStatus::failed("upload rejected");
        assert_eq!(status.stage, Stage::Error);
        assert_eq!(status.percent, 0);
        assert_eq!(status.error.as_deref(), Some("upload rejected"));
    }

    #[test]
    fn present_timestamps_in_canonical_order() {
        let mut ts = AngleTimestamps::new();
        ts.insert(Angle::Top, None);
        ts.insert(Angle::Back, Some("00:12".into()));
        ts.insert(Angle::Side, None);
        ts.insert(Angle::Front, Some("00:05".into()));
        assert_eq!(present_timestamps(&ts), vec!["00:05", "00:12"]);
    }

    #[test]
    fn angle_map_serializes_as_object() {
        let mut ts = AngleTimestamps::new();
        ts.insert(Angle::Front, Some("00:05".into()));
        ts.insert(Angle::Side, None);
        let json = serde_json::to_value(&ts).unwrap();
        assert_eq!(json["front"], "00:05");
        assert!(json["side"].is_null());

        let back: AngleTimestamps = serde_json::from_value(json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn failed_analysis_has_no_angles() {
        let result = AnalysisResult::failed("t".into(), "v".into(), "boom");
        assert_eq!(result.status, AnalysisStatus::Failed);
        assert_eq!(result.angles_found(), 0);
        assert_eq!(result.error.as_deref(), Some("boom"));
    }
}
