//! Axum router construction.
//!
//! Builds the application router with the API routes, static serving of
//! generated models and extracted frames, and the middleware layers.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::routes;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/upload_video",
            post(routes::upload::upload_video).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/jobs", get(routes::jobs::list_jobs))
        .route("/status/{job_id}", get(routes::jobs::get_status))
        .route("/result/{job_id}", get(routes::jobs::get_result))
        .route("/analysis/{task_id}", get(routes::jobs::get_analysis))
        .route("/tools", get(routes::tools::list_tools));

    let server = &ctx.config.server;
    let models = ServeDir::new(server.models_dir());
    let screenshots = ServeDir::new(server.screenshots_dir());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .nest_service("/models", models)
        .nest_service("/screenshots", screenshots)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
