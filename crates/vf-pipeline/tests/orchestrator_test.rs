//! End-to-end orchestrator runs against in-memory collaborators.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::{HarnessBuilder, DESCRIPTION};
use vf_core::{Angle, AnalysisStatus, Error, JobId, Stage, TaskId};
use vf_pipeline::placeholders::{
    PLACEHOLDER_ASSET_HTML, PLACEHOLDER_CONCEPT, PLACEHOLDER_GEOMETRY, PLACEHOLDER_MODEL_URL,
};
use vf_pipeline::{JobStore, StatusUpdate};

fn drain(rx: &mut tokio::sync::broadcast::Receiver<StatusUpdate>) -> Vec<StatusUpdate> {
    let mut seen = Vec::new();
    while let Ok(update) = rx.try_recv() {
        seen.push(update);
    }
    seen
}

fn assert_percent_monotonic(updates: &[StatusUpdate]) {
    let healthy: Vec<u8> = updates
        .iter()
        .filter(|u| u.status.stage != Stage::Error)
        .map(|u| u.status.percent)
        .collect();
    assert!(
        healthy.windows(2).all(|w| w[0] <= w[1]),
        "percent went backwards: {healthy:?}"
    );
}

#[tokio::test]
async fn test_full_run_completes() {
    let h = HarnessBuilder::new().build();
    let mut rx = h.store.subscribe();
    let job = JobId::from("job-1");

    let result = h.orchestrator.run(&job, &h.video).await.unwrap();

    // Every healthy stage was entered, in order, with rising percent.
    let updates = drain(&mut rx);
    assert_percent_monotonic(&updates);
    let mut stages: Vec<Stage> = updates.iter().map(|u| u.status.stage).collect();
    stages.dedup();
    assert_eq!(stages, Stage::PIPELINE.to_vec());

    let status = h.store.get_status(&job);
    assert_eq!(status.stage, Stage::Completed);
    assert_eq!(status.percent, 100);
    assert_eq!(status.message, "Game ready!");

    assert_eq!(result.object_description, DESCRIPTION);
    assert_eq!(result.geometry_code, "cylinder(h=10, r=4);");
    assert_eq!(result.game_concept, "Mug Dash: roll the mug past the spoons.");
    assert_eq!(result.asset_source, "<html><body>game</body></html>");
    assert_eq!(result.model_url, "/models/job-1/model.glb");
    assert_eq!(h.store.get_result(&job), Some(result.clone()));

    // Screenshots are keyed by the angles that produced a timestamp.
    let shots_dir = h.dir.path().join("screenshots").join("job-1");
    assert_eq!(result.screenshots.len(), 2);
    assert_eq!(result.screenshots[&Angle::Front], shots_dir.join("frame_000.jpg"));
    assert_eq!(result.screenshots[&Angle::Back], shots_dir.join("frame_001.jpg"));
    assert_eq!(result.frames.len(), 2);

    // Pacing is the only sleep when the service is immediately ready.
    assert_eq!(h.sleeper.calls(), vec![Duration::from_millis(500); 3]);

    let analysis = h.store.get_analysis(&TaskId::from("task-1")).unwrap();
    assert_eq!(analysis.status, AnalysisStatus::Completed);
    assert_eq!(analysis.screenshots, result.screenshots);
    assert!(h.store.is_task_completed(&TaskId::from("task-1")));
}

#[tokio::test]
async fn test_frames_requested_for_present_angles_in_order() {
    let h = HarnessBuilder::new()
        .angles([Some("00:05"), None, Some("00:12"), None])
        .build();

    h.orchestrator.run(&JobId::from("j"), &h.video).await.unwrap();

    assert_eq!(
        *h.frames.calls.lock(),
        vec![vec!["00:05".to_string(), "00:12".to_string()]]
    );
}

#[tokio::test]
async fn test_frames_fall_back_to_default_times() {
    let h = HarnessBuilder::new().angles([None, None, None, None]).build();

    let result = h.orchestrator.run(&JobId::from("j"), &h.video).await.unwrap();

    assert_eq!(
        *h.frames.calls.lock(),
        vec![vec!["00:01".to_string(), "00:03".to_string(), "00:05".to_string()]]
    );
    assert!(result.screenshots.is_empty());
    assert_eq!(result.frames.len(), 3);
}

#[tokio::test]
async fn test_geometry_prompt_gets_frames_others_do_not() {
    let h = HarnessBuilder::new().build();

    h.orchestrator.run(&JobId::from("j"), &h.video).await.unwrap();

    let calls = h.codegen.calls.lock().clone();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].0.contains(DESCRIPTION));
    assert_eq!(calls[0].1, 2);
    assert_eq!(calls[1].1, 0);
    assert_eq!(calls[2].1, 0);
    assert!(calls[2].0.contains("/models/j/model.glb"));
    assert!(calls[2].0.contains("cylinder(h=10, r=4);"));
}

#[tokio::test]
async fn test_failing_codegen_completes_with_placeholders() {
    let mut builder = HarnessBuilder::new();
    builder.codegen.fail = true;
    let h = builder.build();
    let job = JobId::from("j");

    let result = h.orchestrator.run(&job, &h.video).await.unwrap();

    assert_eq!(h.store.get_status(&job).stage, Stage::Completed);
    assert_eq!(result.geometry_code, PLACEHOLDER_GEOMETRY);
    assert_eq!(result.game_concept, PLACEHOLDER_CONCEPT);
    assert_eq!(result.asset_source, PLACEHOLDER_ASSET_HTML);
    // The placeholder geometry is still handed to the toolchain.
    assert_eq!(*h.geometry.sources.lock(), vec![PLACEHOLDER_GEOMETRY.to_string()]);
}

#[tokio::test]
async fn test_failing_conversion_uses_placeholder_model() {
    let mut builder = HarnessBuilder::new();
    builder.geometry.fail = true;
    let h = builder.build();

    let result = h.orchestrator.run(&JobId::from("j"), &h.video).await.unwrap();

    assert_eq!(result.model_url, PLACEHOLDER_MODEL_URL);
    let calls = h.codegen.calls.lock().clone();
    assert!(calls[2].0.contains(PLACEHOLDER_MODEL_URL));
}

#[tokio::test]
async fn test_upload_failure_moves_job_to_error() {
    let mut builder = HarnessBuilder::new();
    builder.indexing.fail_upload = true;
    let h = builder.build();
    let mut rx = h.store.subscribe();
    let job = JobId::from("j");

    let err = h.orchestrator.run(&job, &h.video).await.unwrap_err();
    assert!(matches!(err, Error::Remote { status: 500, .. }), "{err:?}");

    let updates = drain(&mut rx);
    assert_percent_monotonic(&updates);
    let last = updates.last().unwrap();
    assert_eq!(last.status.stage, Stage::Error);

    let status = h.store.get_status(&job);
    assert_eq!(status.stage, Stage::Error);
    assert_eq!(status.percent, 0);
    assert!(status.error.unwrap().contains("upload refused"));
    assert!(h.store.get_result(&job).is_none());
    assert!(h.frames.calls.lock().is_empty());
}

#[tokio::test]
async fn test_missing_video_is_not_found() {
    let h = HarnessBuilder::new().build();
    let job = JobId::from("j");

    let err = h
        .orchestrator
        .run(&job, &PathBuf::from("/definitely/not/here.mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }), "{err:?}");
    assert_eq!(h.store.get_status(&job).stage, Stage::Error);
    assert!(h.indexing.submitted.lock().is_empty());
}

#[tokio::test]
async fn test_failed_indexing_records_failed_analysis() {
    let mut builder = HarnessBuilder::new();
    builder.indexing.fail_task = true;
    let h = builder.build();
    let job = JobId::from("j");

    let err = h.orchestrator.run(&job, &h.video).await.unwrap_err();

    assert!(matches!(err, Error::TaskFailed { .. }), "{err:?}");
    let task = TaskId::from("task-1");
    assert!(h.store.is_task_failed(&task));
    let analysis = h.store.get_analysis(&task).unwrap();
    assert!(analysis.error.unwrap().contains("unsupported codec"));
    assert_eq!(h.store.get_status(&job).stage, Stage::Error);
}

#[tokio::test]
async fn test_spawn_reports_starting_immediately() {
    let h = HarnessBuilder::new().build();
    let job = JobId::from("spawned");

    let handle = h.orchestrator.spawn_with_id(job.clone(), h.video.clone());
    // Visible before the task has had a chance to run.
    assert_ne!(h.store.get_status(&job).stage, Stage::Unknown);

    handle.await.unwrap();
    assert_eq!(h.store.get_status(&job).stage, Stage::Completed);
    assert!(h.store.get_result(&job).is_some());
}

#[tokio::test]
async fn test_unknown_job_reads_never_fail() {
    let store = JobStore::new();
    let id = JobId::from("missing");

    assert_eq!(store.get_status(&id).stage, Stage::Unknown);
    assert!(store.get_result(&id).is_none());
}
