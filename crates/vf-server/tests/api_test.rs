//! API integration tests
//!
//! Drives the router with `tower::ServiceExt::oneshot`. The orchestrator is
//! the production one built from a config without credentials, so any job
//! that gets started fails at upload without touching the network.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use vf_av::ToolRegistry;
use vf_core::config::Config;
use vf_core::{AngleTimestamps, JobId, Stage, TaskId};
use vf_server::context::AppContext;
use vf_server::router::build_router;
use vf_server::build_orchestrator;

const BOUNDARY: &str = "vidforge-test-boundary";

/// Create a test context whose directories live under a scratch dir.
fn create_test_context() -> (AppContext, TempDir) {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.server.upload_dir = dir.path().join("uploads");
    config.server.data_dir = dir.path().join("data");
    config.pipeline.skip_polling = true;

    let tools = ToolRegistry::default();
    let orchestrator = build_orchestrator(&config, &tools);
    (AppContext::new(config, orchestrator, tools), dir)
}

/// Helper to get response body as JSON
async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_request(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/api/upload_video")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response.into_body()).await)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (ctx, _dir) = create_test_context();
    let (status, json) = get(build_router(ctx), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_status_unknown_job() {
    let (ctx, _dir) = create_test_context();
    let (status, json) = get(build_router(ctx), "/api/status/nope").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stage"], "unknown");
    assert_eq!(json["percent"], 0);
    assert_eq!(json["message"], "Job not found");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_status_reports_stage() {
    let (ctx, _dir) = create_test_context();
    ctx.store().set_stage(&JobId::from("j1"), Stage::Analyzing);

    let (_, json) = get(build_router(ctx), "/api/status/j1").await;
    assert_eq!(json["stage"], "analyzing");
    assert_eq!(json["percent"], Stage::Analyzing.percent());
}

#[tokio::test]
async fn test_result_pending_is_empty_object() {
    let (ctx, _dir) = create_test_context();
    let (status, json) = get(build_router(ctx), "/api/result/nope").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({}));
}

#[tokio::test]
async fn test_jobs_list() {
    let (ctx, _dir) = create_test_context();
    let app = build_router(ctx.clone());

    let (_, json) = get(app.clone(), "/api/jobs").await;
    assert_eq!(json, serde_json::json!([]));

    ctx.store().set_stage(&JobId::from("j1"), Stage::Starting);
    let (_, json) = get(app, "/api/jobs").await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["job_id"], "j1");
    assert_eq!(json[0]["status"]["stage"], "starting");
}

#[tokio::test]
async fn test_analysis_lookup() {
    let (ctx, _dir) = create_test_context();
    ctx.store().put_analysis(vf_core::AnalysisResult::completed(
        TaskId::from("t1"),
        "v1".into(),
        "a red mug".into(),
        AngleTimestamps::new(),
    ));
    let app = build_router(ctx);

    let (status, json) = get(app.clone(), "/api/analysis/t1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["description"], "a red mug");
    assert_eq!(json["status"], "completed");

    let (status, json) = get(app, "/api/analysis/t2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn test_tools_lists_known_tools() {
    let (ctx, _dir) = create_test_context();
    let (status, json) = get(build_router(ctx), "/api/tools").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ffmpeg", "openscad", "blender"]);
    assert!(json.as_array().unwrap().iter().all(|t| t["available"] == false));
}

#[tokio::test]
async fn test_upload_rejects_non_mp4() {
    let (ctx, dir) = create_test_context();
    let app = build_router(ctx);

    let response = app
        .oneshot(multipart_request("video", "clip.mov", "video/quicktime", b"data"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["code"], "validation_error");
    assert!(!dir.path().join("uploads").exists());
}

#[tokio::test]
async fn test_upload_rejects_non_video_content_type() {
    let (ctx, _dir) = create_test_context();
    let response = build_router(ctx)
        .oneshot(multipart_request("video", "clip.mp4", "text/plain", b"data"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_requires_video_field() {
    let (ctx, _dir) = create_test_context();
    let response = build_router(ctx)
        .oneshot(multipart_request("file", "clip.mp4", "video/mp4", b"data"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_starts_job() {
    let (ctx, dir) = create_test_context();
    let store = ctx.store().clone();
    let app = build_router(ctx);

    let response = app
        .oneshot(multipart_request("video", "Clip.MP4", "video/mp4", b"not really a video"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["message"], "Processing started");
    let job_id = JobId::from(json["job_id"].as_str().unwrap());

    let saved = dir.path().join("uploads").join(format!("{job_id}.mp4"));
    assert_eq!(std::fs::read(saved).unwrap(), b"not really a video");
    assert_ne!(store.get_status(&job_id).stage, Stage::Unknown);

    // No index id is configured, so the job fails at upload.
    let mut stage = store.get_status(&job_id).stage;
    for _ in 0..100 {
        if stage == Stage::Error {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        stage = store.get_status(&job_id).stage;
    }
    assert_eq!(stage, Stage::Error);
    assert!(store.get_result(&job_id).is_none());
}

#[tokio::test]
async fn test_models_are_served() {
    let (ctx, _dir) = create_test_context();
    let job_dir = ctx.config.server.models_dir().join("j1");
    std::fs::create_dir_all(&job_dir).unwrap();
    std::fs::write(job_dir.join("model.glb"), b"glTF").unwrap();

    let response = build_router(ctx)
        .oneshot(Request::get("/models/j1/model.glb").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"glTF");
}
