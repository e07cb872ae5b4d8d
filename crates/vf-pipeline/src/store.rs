//! In-memory job state shared between pipeline runs and status readers.
//!
//! [`JobStore`] holds three maps (job status, job result, analysis per
//! indexing task) behind `parking_lot::RwLock`s. Every status write is also
//! broadcast as a [`StatusUpdate`] so observers see each transition in the
//! order it happened. Nothing is persisted.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use vf_core::{
    AnalysisResult, AnalysisStatus, JobId, JobStatus, PipelineRunResult, Stage, TaskId,
};

/// Capacity of the status broadcast channel.
const STATUS_CHANNEL_CAPACITY: usize = 256;

/// A status write, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// Status, result and analysis records for all jobs of this process.
pub struct JobStore {
    statuses: RwLock<HashMap<JobId, JobStatus>>,
    results: RwLock<HashMap<JobId, PipelineRunResult>>,
    analyses: RwLock<HashMap<TaskId, AnalysisResult>>,
    updates: broadcast::Sender<StatusUpdate>,
}

impl JobStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            statuses: RwLock::new(HashMap::new()),
            results: RwLock::new(HashMap::new()),
            analyses: RwLock::new(HashMap::new()),
            updates,
        }
    }

    /// Receive every status write made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.updates.subscribe()
    }

    // -- Status ---------------------------------------------------------------

    /// Overwrite the status of `job_id` and broadcast the change.
    pub fn set_status(
        &self,
        job_id: &JobId,
        stage: Stage,
        percent: u8,
        message: impl Into<String>,
        error: Option<String>,
    ) {
        self.put_status(
            job_id,
            JobStatus {
                stage,
                percent,
                message: message.into(),
                error,
                updated_at: Utc::now(),
            },
        );
    }

    /// Move `job_id` to the start of `stage` with its standard percent and
    /// message.
    pub fn set_stage(&self, job_id: &JobId, stage: Stage) {
        self.put_status(job_id, JobStatus::at(stage));
    }

    /// Move `job_id` to the terminal error stage.
    pub fn set_failed(&self, job_id: &JobId, error: impl Into<String>) {
        self.put_status(job_id, JobStatus::failed(error));
    }

    fn put_status(&self, job_id: &JobId, status: JobStatus) {
        tracing::debug!(
            job_id = %job_id,
            stage = %status.stage,
            percent = status.percent,
            "status update"
        );
        self.statuses.write().insert(job_id.clone(), status.clone());

        // No receivers is fine.
        let _ = self.updates.send(StatusUpdate {
            job_id: job_id.clone(),
            status,
        });
    }

    /// Current status; unseen ids report [`JobStatus::unknown`].
    pub fn get_status(&self, job_id: &JobId) -> JobStatus {
        self.statuses
            .read()
            .get(job_id)
            .cloned()
            .unwrap_or_else(JobStatus::unknown)
    }

    /// Snapshot of every known job, most recently updated first.
    pub fn list_statuses(&self) -> Vec<StatusUpdate> {
        let mut all: Vec<StatusUpdate> = self
            .statuses
            .read()
            .iter()
            .map(|(job_id, status)| StatusUpdate {
                job_id: job_id.clone(),
                status: status.clone(),
            })
            .collect();
        all.sort_by(|a, b| b.status.updated_at.cmp(&a.status.updated_at));
        all
    }

    // -- Results --------------------------------------------------------------

    pub fn put_result(&self, result: PipelineRunResult) {
        self.results.write().insert(result.job_id.clone(), result);
    }

    /// Result of a completed job; `None` while running, failed or unseen.
    pub fn get_result(&self, job_id: &JobId) -> Option<PipelineRunResult> {
        self.results.read().get(job_id).cloned()
    }

    // -- Analyses -------------------------------------------------------------

    pub fn put_analysis(&self, analysis: AnalysisResult) {
        self.analyses
            .write()
            .insert(analysis.task_id.clone(), analysis);
    }

    pub fn get_analysis(&self, task_id: &TaskId) -> Option<AnalysisResult> {
        self.analyses.read().get(task_id).cloned()
    }

    pub fn is_task_completed(&self, task_id: &TaskId) -> bool {
        self.analysis_status(task_id) == Some(AnalysisStatus::Completed)
    }

    pub fn is_task_failed(&self, task_id: &TaskId) -> bool {
        self.analysis_status(task_id) == Some(AnalysisStatus::Failed)
    }

    fn analysis_status(&self, task_id: &TaskId) -> Option<AnalysisStatus> {
        self.analyses.read().get(task_id).map(|a| a.status)
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for JobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobStore")
            .field("jobs", &self.statuses.read().len())
            .field("results", &self.results.read().len())
            .field("analyses", &self.analyses.read().len())
            .finish()
    }
}
