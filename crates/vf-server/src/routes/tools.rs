//! External tool availability.

use axum::extract::State;
use axum::Json;

use crate::context::AppContext;
use crate::error::AppError;

/// GET /api/tools
///
/// Version detection runs each tool once, so it happens off the async
/// workers.
pub async fn list_tools(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<vf_av::ToolInfo>>, AppError> {
    let tools = ctx.tools.clone();
    let infos = tokio::task::spawn_blocking(move || tools.check_all())
        .await
        .map_err(|e| vf_core::Error::Internal(format!("tool check panicked: {e}")))?;
    Ok(Json(infos))
}
