//! Stage sequencer: one video in, one playable game out.
//!
//! [`Orchestrator::run`] drives a job through upload, analysis, frame
//! extraction, three code-generation calls and model conversion, recording
//! every transition in the [`JobStore`]. Upload, indexing and the
//! description query are fatal; generation and conversion fall back to
//! placeholder artifacts; a failed angle query only loses that angle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use vf_av::geometry::GLB_FILE;
use vf_core::config::Config;
use vf_core::{
    present_timestamps, AnalysisResult, AngleScreenshots, AngleTimestamps, Error, JobId,
    PipelineRunResult, Result, Stage,
};

use crate::context::PipelineContext;
use crate::placeholders::{
    PLACEHOLDER_ASSET_HTML, PLACEHOLDER_CONCEPT, PLACEHOLDER_GEOMETRY, PLACEHOLDER_MODEL_URL,
};
use crate::poller::{await_ready, await_terminal};
use crate::prompts::{asset_prompt, concept_prompt, geometry_prompt, unwrap_code_block};
use crate::query::QueryClient;
use crate::retry::RetryPolicy;
use crate::services::{ExtractedFrame, Upload};
use crate::store::JobStore;

/// Tunables of a pipeline run, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub task_poll: RetryPolicy,
    pub readiness_poll: RetryPolicy,
    pub query: RetryPolicy,
    pub angle_pacing: Duration,
    pub skip_polling: bool,
    /// Frames extracted when no angle produced a timestamp.
    pub default_frame_timestamps: Vec<String>,
    /// Converted meshes land in `models_dir/{job_id}/`.
    pub models_dir: PathBuf,
    /// Extracted frames land in `screenshots_dir/{job_id}/`.
    pub screenshots_dir: PathBuf,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        let p = &config.pipeline;
        Self {
            task_poll: RetryPolicy::fixed(p.task_poll_interval(), p.task_poll_attempts),
            readiness_poll: RetryPolicy::fixed(
                p.readiness_poll_interval(),
                p.readiness_poll_attempts,
            ),
            query: RetryPolicy::exponential(
                p.query_max_attempts,
                p.query_initial_delay(),
                p.query_backoff_multiplier,
                p.query_max_delay(),
            ),
            angle_pacing: p.angle_pacing(),
            skip_polling: p.skip_polling,
            default_frame_timestamps: p.default_frame_timestamps.clone(),
            models_dir: config.server.models_dir(),
            screenshots_dir: config.server.screenshots_dir(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Runs pipeline jobs against a shared [`JobStore`].
#[derive(Debug, Clone)]
pub struct Orchestrator {
    ctx: PipelineContext,
    store: Arc<JobStore>,
    config: Arc<OrchestratorConfig>,
}

impl Orchestrator {
    pub fn new(ctx: PipelineContext, store: Arc<JobStore>, config: OrchestratorConfig) -> Self {
        Self {
            ctx,
            store,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Start a job under a fresh id and return immediately.
    pub fn spawn(&self, video: PathBuf) -> JobId {
        let job_id = JobId::new();
        self.spawn_with_id(job_id.clone(), video);
        job_id
    }

    /// Start a job under `job_id` and return immediately.
    ///
    /// The job is already `starting` when this returns.
    pub fn spawn_with_id(&self, job_id: JobId, video: PathBuf) -> tokio::task::JoinHandle<()> {
        self.store.set_stage(&job_id, Stage::Starting);

        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.run(&job_id, &video).await {
                tracing::error!(job_id = %job_id, "pipeline failed: {e}");
            }
        })
    }

    /// Run a job to completion.
    ///
    /// On error the job's status is already `error` when this returns.
    pub async fn run(&self, job_id: &JobId, video: &Path) -> Result<PipelineRunResult> {
        let span = tracing::info_span!("pipeline", job_id = %job_id);

        async {
            tracing::info!(video = %video.display(), "pipeline started");
            match self.execute(job_id, video).await {
                Ok(result) => {
                    tracing::info!(model_url = %result.model_url, "pipeline completed");
                    Ok(result)
                }
                Err(e) => {
                    self.store.set_failed(job_id, e.to_string());
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    fn enter(&self, job_id: &JobId, stage: Stage) {
        tracing::info!(
            job_id = %job_id,
            stage = %stage,
            percent = stage.percent(),
            "{}",
            stage.message()
        );
        self.store.set_stage(job_id, stage);
    }

    async fn execute(&self, job_id: &JobId, video: &Path) -> Result<PipelineRunResult> {
        self.enter(job_id, Stage::Starting);

        // -- uploading --------------------------------------------------------
        self.enter(job_id, Stage::Uploading);
        if !video.is_file() {
            return Err(Error::not_found("video file", video.display()));
        }
        let upload = self.ctx.indexing.submit(video).await?;
        tracing::info!(task_id = %upload.task_id, video_id = %upload.video_id, "video submitted");

        // -- analyzing --------------------------------------------------------
        self.enter(job_id, Stage::Analyzing);
        let mut analysis = match self.analyze(&upload).await {
            Ok(analysis) => analysis,
            Err(e) => {
                self.store.put_analysis(AnalysisResult::failed(
                    upload.task_id.clone(),
                    upload.video_id.clone(),
                    e.to_string(),
                ));
                return Err(e);
            }
        };
        tracing::info!(
            task_id = %upload.task_id,
            angles_found = analysis.angles_found(),
            "analysis completed"
        );
        self.store.put_analysis(analysis.clone());

        // -- extracting_frames ------------------------------------------------
        self.enter(job_id, Stage::ExtractingFrames);
        let mut requested = present_timestamps(&analysis.timestamps);
        if requested.is_empty() {
            tracing::info!("no angle timestamps; using default frame times");
            requested = self.config.default_frame_timestamps.clone();
        }
        let frames_dir = self.config.screenshots_dir.join(job_id.as_str());
        let frames = self.ctx.frames.extract(video, &requested, &frames_dir).await?;
        analysis.screenshots = screenshots_for(&analysis.timestamps, &frames);
        self.store.put_analysis(analysis.clone());
        let frame_paths: Vec<PathBuf> = frames.into_iter().map(|f| f.path).collect();

        // -- generating_geometry_code -----------------------------------------
        self.enter(job_id, Stage::GeneratingGeometryCode);
        let geometry_code = self
            .generate(
                "geometry",
                &geometry_prompt(&analysis.description),
                &frame_paths,
                PLACEHOLDER_GEOMETRY,
            )
            .await;

        // -- generating_concept -----------------------------------------------
        self.enter(job_id, Stage::GeneratingConcept);
        let game_concept = self
            .generate(
                "concept",
                &concept_prompt(&analysis.description),
                &[],
                PLACEHOLDER_CONCEPT,
            )
            .await;

        // -- converting_model -------------------------------------------------
        self.enter(job_id, Stage::ConvertingModel);
        let model_url = self.convert(job_id, &geometry_code).await;

        // -- generating_asset_code --------------------------------------------
        self.enter(job_id, Stage::GeneratingAssetCode);
        let asset_source = self
            .generate(
                "asset",
                &asset_prompt(&game_concept, &model_url, &geometry_code),
                &[],
                PLACEHOLDER_ASSET_HTML,
            )
            .await;

        // -- completed --------------------------------------------------------
        let result = PipelineRunResult {
            job_id: job_id.clone(),
            video_id: upload.video_id,
            task_id: upload.task_id,
            object_description: analysis.description,
            timestamps: analysis.timestamps,
            screenshots: analysis.screenshots,
            frames: frame_paths,
            geometry_code,
            game_concept,
            model_url,
            asset_source,
        };
        self.store.put_result(result.clone());
        self.enter(job_id, Stage::Completed);

        Ok(result)
    }

    async fn analyze(&self, upload: &Upload) -> Result<AnalysisResult> {
        if self.config.skip_polling {
            tracing::info!(task_id = %upload.task_id, "skipping indexing polls");
        } else {
            await_terminal(
                self.ctx.indexing.as_ref(),
                self.ctx.sleeper.as_ref(),
                &upload.task_id,
                &self.config.task_poll,
            )
            .await?;
            await_ready(
                self.ctx.indexing.as_ref(),
                self.ctx.analysis.as_ref(),
                self.ctx.sleeper.as_ref(),
                &upload.video_id,
                &self.config.readiness_poll,
            )
            .await?;
        }

        let queries = QueryClient::new(self.ctx.analysis.clone(), self.ctx.sleeper.clone())
            .with_policy(self.config.query)
            .with_pacing(self.config.angle_pacing);

        let description = queries.describe(&upload.video_id).await?;
        let timestamps = queries.angle_timestamps(&upload.video_id).await;

        Ok(AnalysisResult::completed(
            upload.task_id.clone(),
            upload.video_id.clone(),
            description,
            timestamps,
        ))
    }

    /// Ask the code generator; any failure or empty answer yields `fallback`.
    async fn generate(
        &self,
        what: &'static str,
        prompt: &str,
        images: &[PathBuf],
        fallback: &str,
    ) -> String {
        match self.ctx.codegen.generate(prompt, images).await {
            Ok(text) => {
                let code = unwrap_code_block(&text);
                if code.is_empty() {
                    tracing::warn!(what, "empty generation; using placeholder");
                    fallback.to_string()
                } else {
                    tracing::info!(what, chars = code.len(), "generation succeeded");
                    code
                }
            }
            Err(e) => {
                tracing::warn!(what, "generation failed ({e}); using placeholder");
                fallback.to_string()
            }
        }
    }

    /// Compile and convert the geometry; any failure yields the placeholder
    /// model URL.
    async fn convert(&self, job_id: &JobId, geometry_code: &str) -> String {
        let out_dir = self.config.models_dir.join(job_id.as_str());

        let converted = async {
            let mesh = self.ctx.geometry.compile_script(geometry_code, &out_dir).await?;
            self.ctx.geometry.convert_mesh(&mesh, &out_dir).await
        }
        .await;

        match converted {
            Ok(path) => {
                tracing::info!(model = %path.display(), "model converted");
                format!("/models/{job_id}/{GLB_FILE}")
            }
            Err(e) => {
                tracing::warn!("model conversion failed ({e}); using placeholder model");
                PLACEHOLDER_MODEL_URL.to_string()
            }
        }
    }
}

/// Map each angle with a timestamp to the frame extracted at that time.
fn screenshots_for(timestamps: &AngleTimestamps, frames: &[ExtractedFrame]) -> AngleScreenshots {
    timestamps
        .iter()
        .filter_map(|(angle, ts)| {
            let ts = ts.as_deref()?;
            frames
                .iter()
                .find(|f| f.timestamp.as_deref() == Some(ts))
                .map(|f| (*angle, f.path.clone()))
        })
        .collect()
}
