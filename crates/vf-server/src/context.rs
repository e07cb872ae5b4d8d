//! Application context shared by every route handler via Axum state.

use std::sync::Arc;

use vf_av::ToolRegistry;
use vf_core::config::Config;
use vf_pipeline::{JobStore, Orchestrator};

/// Cloned into each request; every field is reference counted.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub orchestrator: Orchestrator,
    pub tools: Arc<ToolRegistry>,
}

impl AppContext {
    pub fn new(config: Config, orchestrator: Orchestrator, tools: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            tools: Arc::new(tools),
        }
    }

    /// Status, result and analysis records written by running jobs.
    pub fn store(&self) -> &Arc<JobStore> {
        self.orchestrator.store()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("orchestrator", &self.orchestrator)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}
