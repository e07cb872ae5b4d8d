//! Collaborators shared by every stage of a pipeline run.

use std::sync::Arc;

use crate::retry::{Sleeper, TokioSleeper};
use crate::services::{
    AnalysisService, CodeGenerator, FrameExtractor, GeometryToolchain, IndexingService,
};

/// Remote services, local tools and the backoff clock used by the
/// orchestrator. Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct PipelineContext {
    pub indexing: Arc<dyn IndexingService>,
    pub analysis: Arc<dyn AnalysisService>,
    pub codegen: Arc<dyn CodeGenerator>,
    pub frames: Arc<dyn FrameExtractor>,
    pub geometry: Arc<dyn GeometryToolchain>,
    /// Every poll interval, backoff delay and pacing pause goes through here.
    pub sleeper: Arc<dyn Sleeper>,
}

impl PipelineContext {
    /// Create a context that sleeps on the tokio timer.
    pub fn new(
        indexing: Arc<dyn IndexingService>,
        analysis: Arc<dyn AnalysisService>,
        codegen: Arc<dyn CodeGenerator>,
        frames: Arc<dyn FrameExtractor>,
        geometry: Arc<dyn GeometryToolchain>,
    ) -> Self {
        Self {
            indexing,
            analysis,
            codegen,
            frames,
            geometry,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Builder: replace the sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext").finish_non_exhaustive()
    }
}
