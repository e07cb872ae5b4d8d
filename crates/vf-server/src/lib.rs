//! vf-server: HTTP front door of the vidforge pipeline.
//!
//! This crate wires the concrete service clients and local tools into an
//! [`Orchestrator`] and exposes it over HTTP:
//!
//! - Axum-based API for uploads, job status, results and analyses
//! - Static serving of converted models and extracted frames
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod router;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use vf_av::{FfmpegFrameExtractor, OpenScadBlender, ToolRegistry};
use vf_clients::{OpenAiClient, TwelveLabsClient};
use vf_core::config::Config;
use vf_pipeline::{JobStore, Orchestrator, OrchestratorConfig, PipelineContext};

use crate::context::AppContext;

/// Build an [`Orchestrator`] backed by the real remote services and the
/// discovered tools.
pub fn build_orchestrator(config: &Config, tools: &ToolRegistry) -> Orchestrator {
    let indexing = Arc::new(TwelveLabsClient::from_config(&config.indexing));
    let ctx = PipelineContext::new(
        indexing.clone(),
        indexing,
        Arc::new(OpenAiClient::from_config(&config.codegen)),
        Arc::new(FfmpegFrameExtractor::from_registry(tools)),
        Arc::new(OpenScadBlender::from_registry(tools)),
    );
    Orchestrator::new(
        ctx,
        Arc::new(JobStore::new()),
        OrchestratorConfig::from_config(config),
    )
}

/// Discover tools and assemble the [`AppContext`] for `config`.
pub fn build_context(config: Config) -> AppContext {
    let tools = ToolRegistry::discover(&config.tools);
    for info in tools.check_all() {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            tracing::warn!("Tool not found: {}; its stage will use placeholders", info.name);
        }
    }

    let orchestrator = build_orchestrator(&config, &tools);
    AppContext::new(config, orchestrator, tools)
}

/// Start the vidforge server.
///
/// Creates the upload and output directories, binds the listener and serves
/// until a shutdown signal is received. Jobs still running at shutdown are
/// abandoned.
pub async fn start(config: Config) -> vf_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    for dir in [
        config.server.upload_dir.clone(),
        config.server.models_dir(),
        config.server.screenshots_dir(),
    ] {
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!("Using directory {}", dir.display());
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| vf_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = build_context(config);
    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| vf_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Starting server on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
