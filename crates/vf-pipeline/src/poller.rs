//! Waiting on remote state: indexing tasks and video readiness.
//!
//! Both pollers run on the shared [`retry`] combinator with a fixed-interval
//! policy. A poll that cannot reach the service aborts the wait; only
//! non-terminal statuses are retried.

use vf_core::{Error, Result, TaskId, VideoId};

use crate::retry::{retry, Attempt, RetryError, RetryPolicy, Sleeper};
use crate::services::{AnalysisService, IndexingService, RemoteState};

/// Trial question used to confirm a "ready" video can really be analyzed.
pub const PROBE_PROMPT: &str = "What is the main object in this video?";
pub const PROBE_TEMPERATURE: f32 = 0.1;

fn timeout_error(what: String, outcome: RetryError<Error>) -> Error {
    match outcome {
        RetryError::Fatal(e) => e,
        RetryError::Exhausted { attempts, .. } => Error::PollingTimeout { what, attempts },
    }
}

/// Poll an indexing task until it completes.
///
/// # Errors
///
/// - [`Error::TaskFailed`] as soon as the task reports `failed`.
/// - [`Error::PollingTimeout`] when the policy's attempts run out.
/// - Any error from [`IndexingService::task_status`], unretried.
pub async fn await_terminal(
    indexing: &dyn IndexingService,
    sleeper: &dyn Sleeper,
    task_id: &TaskId,
    policy: &RetryPolicy,
) -> Result<()> {
    let max_attempts = policy.max_attempts;
    retry(policy, sleeper, |attempt| {
        poll_task(indexing, task_id, attempt, max_attempts)
    })
    .await
    .map_err(|e| timeout_error(format!("task {task_id}"), e))
}

async fn poll_task(
    indexing: &dyn IndexingService,
    task_id: &TaskId,
    attempt: u32,
    max_attempts: u32,
) -> Result<Attempt<()>> {
    let status = indexing.task_status(task_id).await?;
    tracing::info!(
        task_id = %task_id,
        attempt,
        max_attempts,
        status = %status.status,
        "task status"
    );

    match status.state() {
        RemoteState::Succeeded => Ok(Attempt::Done(())),
        RemoteState::Failed => Err(Error::task_failed(task_id, status.error_message())),
        RemoteState::Pending => Ok(Attempt::Retry(status.status)),
        RemoteState::Unknown => {
            tracing::warn!(
                task_id = %task_id,
                status = %status.status,
                "unknown task status; continuing to poll"
            );
            Ok(Attempt::Retry(status.status))
        }
    }
}

/// Poll a video until the analysis service can answer questions about it.
///
/// A `ready` status is confirmed with a probe query; the probe answering
/// "not ready" keeps the poll going, any other probe outcome counts as ready.
///
/// # Errors
///
/// - [`Error::TaskFailed`] when the video's indexing reports `failed`.
/// - [`Error::PollingTimeout`] when the policy's attempts run out.
/// - Any error from [`IndexingService::resource_status`], unretried.
pub async fn await_ready(
    indexing: &dyn IndexingService,
    analysis: &dyn AnalysisService,
    sleeper: &dyn Sleeper,
    video_id: &VideoId,
    policy: &RetryPolicy,
) -> Result<()> {
    let max_attempts = policy.max_attempts;
    retry(policy, sleeper, |attempt| {
        poll_resource(indexing, analysis, video_id, attempt, max_attempts)
    })
    .await
    .map_err(|e| timeout_error(format!("video {video_id}"), e))
}

async fn poll_resource(
    indexing: &dyn IndexingService,
    analysis: &dyn AnalysisService,
    video_id: &VideoId,
    attempt: u32,
    max_attempts: u32,
) -> Result<Attempt<()>> {
    let Some(status) = indexing.resource_status(video_id).await? else {
        tracing::info!(
            video_id = %video_id,
            attempt,
            max_attempts,
            "no indexing record for video yet"
        );
        return Ok(Attempt::Retry("no record yet".into()));
    };

    tracing::info!(
        video_id = %video_id,
        attempt,
        max_attempts,
        status = %status.status,
        "video indexing status"
    );

    match status.state() {
        RemoteState::Succeeded => {
            if probe(analysis, video_id).await {
                tracing::info!(video_id = %video_id, "video ready for analysis");
                Ok(Attempt::Done(()))
            } else {
                Ok(Attempt::Retry("analysis not available yet".into()))
            }
        }
        RemoteState::Failed => Err(Error::task_failed(video_id, status.error_message())),
        RemoteState::Pending => Ok(Attempt::Retry(status.status)),
        RemoteState::Unknown => {
            tracing::warn!(
                video_id = %video_id,
                status = %status.status,
                "unknown video status; continuing to poll"
            );
            Ok(Attempt::Retry(status.status))
        }
    }
}

async fn probe(analysis: &dyn AnalysisService, video_id: &VideoId) -> bool {
    match analysis.analyze(video_id, PROBE_PROMPT, PROBE_TEMPERATURE).await {
        Ok(_) => true,
        Err(Error::NotReady(reason)) => {
            tracing::info!(video_id = %video_id, %reason, "status ready but analysis is not");
            false
        }
        Err(e) => {
            tracing::warn!(video_id = %video_id, "readiness probe failed ({e}); assuming ready");
            true
        }
    }
}
