//! Shared fakes for orchestrator integration tests.
//!
//! [`Harness`] wires an [`Orchestrator`] to in-memory collaborators that
//! record how they were called, plus a scratch directory holding the input
//! video and the output trees.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use vf_core::{Angle, Error, Result, TaskId, VideoId};
use vf_pipeline::poller::PROBE_PROMPT;
use vf_pipeline::prompts::{angle_prompt, DESCRIPTION_PROMPT};
use vf_pipeline::{
    AnalysisService, CodeGenerator, ExtractedFrame, FrameExtractor, GeometryToolchain,
    IndexingService, JobStore, Orchestrator, OrchestratorConfig, PipelineContext,
    RecordingSleeper, RemoteStatus, Upload,
};

pub const DESCRIPTION: &str = "A white ceramic mug with a curved handle.";

// ---------------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeIndexing {
    pub fail_upload: bool,
    pub fail_task: bool,
    pub submitted: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl IndexingService for FakeIndexing {
    async fn submit(&self, video: &Path) -> Result<Upload> {
        self.submitted.lock().push(video.to_path_buf());
        if self.fail_upload {
            return Err(Error::remote(500, "upload refused"));
        }
        Ok(Upload {
            task_id: TaskId::from("task-1"),
            video_id: VideoId::from("video-1"),
        })
    }

    async fn task_status(&self, _task_id: &TaskId) -> Result<RemoteStatus> {
        if self.fail_task {
            return Ok(RemoteStatus::failed("unsupported codec"));
        }
        Ok(RemoteStatus::new("ready"))
    }

    async fn resource_status(&self, _video_id: &VideoId) -> Result<Option<RemoteStatus>> {
        Ok(Some(RemoteStatus::new("ready")))
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Answers the probe and description, and each angle from a table.
pub struct FakeAnalysis {
    pub angles: HashMap<Angle, Option<&'static str>>,
}

impl FakeAnalysis {
    pub fn with_angles(angles: [Option<&'static str>; 4]) -> Self {
        Self {
            angles: Angle::ALL.into_iter().zip(angles).collect(),
        }
    }
}

#[async_trait]
impl AnalysisService for FakeAnalysis {
    async fn analyze(&self, _video_id: &VideoId, prompt: &str, _temperature: f32) -> Result<String> {
        if prompt == PROBE_PROMPT {
            return Ok("A mug.".into());
        }
        if prompt == DESCRIPTION_PROMPT {
            return Ok(format!(r#"{{"id":"r1","data":"{DESCRIPTION}"}}"#));
        }
        for angle in Angle::ALL {
            if prompt == angle_prompt(angle) {
                let answer = match self.angles.get(&angle).copied().flatten() {
                    Some(ts) => format!("({ts})"),
                    None => "null".to_string(),
                };
                return Ok(answer);
            }
        }
        Err(Error::remote(400, "unexpected prompt"))
    }
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCodegen {
    pub fail: bool,
    /// (prompt, number of images) per call.
    pub calls: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl CodeGenerator for FakeCodegen {
    async fn generate(&self, prompt: &str, images: &[PathBuf]) -> Result<String> {
        self.calls.lock().push((prompt.to_string(), images.len()));
        if self.fail {
            return Err(Error::remote(429, "rate limited"));
        }
        if prompt.starts_with("You are an expert in OpenSCAD") {
            Ok("```openscad\ncylinder(h=10, r=4);\n```".into())
        } else if prompt.starts_with("You are a game designer") {
            Ok("Mug Dash: roll the mug past the spoons.".into())
        } else {
            Ok("```html\n<html><body>game</body></html>\n```".into())
        }
    }
}

// ---------------------------------------------------------------------------
// Frames and geometry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeFrames {
    pub calls: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl FrameExtractor for FakeFrames {
    async fn extract(
        &self,
        _video: &Path,
        timestamps: &[String],
        out_dir: &Path,
    ) -> Result<Vec<ExtractedFrame>> {
        self.calls.lock().push(timestamps.to_vec());
        Ok(timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| ExtractedFrame {
                timestamp: Some(ts.clone()),
                path: out_dir.join(format!("frame_{i:03}.jpg")),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeGeometry {
    pub fail: bool,
    pub sources: Mutex<Vec<String>>,
}

#[async_trait]
impl GeometryToolchain for FakeGeometry {
    async fn compile_script(&self, source: &str, out_dir: &Path) -> Result<PathBuf> {
        self.sources.lock().push(source.to_string());
        if self.fail {
            return Err(Error::tool("openscad", "syntax error"));
        }
        Ok(out_dir.join("model.stl"))
    }

    async fn convert_mesh(&self, _mesh: &Path, out_dir: &Path) -> Result<PathBuf> {
        Ok(out_dir.join("model.glb"))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub store: Arc<JobStore>,
    pub indexing: Arc<FakeIndexing>,
    pub codegen: Arc<FakeCodegen>,
    pub frames: Arc<FakeFrames>,
    pub geometry: Arc<FakeGeometry>,
    pub sleeper: RecordingSleeper,
    pub video: PathBuf,
    pub dir: TempDir,
}

pub struct HarnessBuilder {
    pub indexing: FakeIndexing,
    pub analysis: FakeAnalysis,
    pub codegen: FakeCodegen,
    pub geometry: FakeGeometry,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            indexing: FakeIndexing::default(),
            analysis: FakeAnalysis::with_angles([Some("00:05"), None, Some("00:12"), None]),
            codegen: FakeCodegen::default(),
            geometry: FakeGeometry::default(),
        }
    }

    pub fn angles(mut self, angles: [Option<&'static str>; 4]) -> Self {
        self.analysis = FakeAnalysis::with_angles(angles);
        self
    }

    pub fn build(self) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"not really a video").expect("write video");

        let indexing = Arc::new(self.indexing);
        let codegen = Arc::new(self.codegen);
        let frames = Arc::new(FakeFrames::default());
        let geometry = Arc::new(self.geometry);
        let sleeper = RecordingSleeper::new();

        let ctx = PipelineContext::new(
            indexing.clone(),
            Arc::new(self.analysis),
            codegen.clone(),
            frames.clone(),
            geometry.clone(),
        )
        .with_sleeper(Arc::new(sleeper.clone()));

        let config = OrchestratorConfig {
            models_dir: dir.path().join("models"),
            screenshots_dir: dir.path().join("screenshots"),
            ..OrchestratorConfig::default()
        };

        let store = Arc::new(JobStore::new());
        let orchestrator = Orchestrator::new(ctx, store.clone(), config);

        Harness {
            orchestrator,
            store,
            indexing,
            codegen,
            frames,
            geometry,
            sleeper,
            video,
            dir,
        }
    }
}
