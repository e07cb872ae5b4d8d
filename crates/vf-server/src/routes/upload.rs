//! Video upload: the entry point of every pipeline job.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use vf_core::{Error, JobId};

use crate::context::AppContext;
use crate::error::AppError;

/// Multipart field carrying the video.
const VIDEO_FIELD: &str = "video";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: JobId,
    pub message: &'static str,
}

/// Accept only `.mp4` names sent with a `video/*` content type.
fn validate_video(file_name: Option<&str>, content_type: Option<&str>) -> vf_core::Result<()> {
    let is_mp4 = file_name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".mp4"));
    if !is_mp4 {
        return Err(Error::Validation("Only MP4 files are supported".into()));
    }
    if !content_type.is_some_and(|t| t.starts_with("video/")) {
        return Err(Error::Validation(
            "Invalid file type. Please upload a video file".into(),
        ));
    }
    Ok(())
}

/// POST /api/upload_video
///
/// Saves the video as `{upload_dir}/{job_id}.mp4` and starts the pipeline in
/// the background. The job is `starting` by the time this responds.
pub async fn upload_video(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        validate_video(field.file_name(), field.content_type())?;
        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("Failed to read upload: {e}")))?;

        let job_id = JobId::new();
        let upload_dir = &ctx.config.server.upload_dir;
        tokio::fs::create_dir_all(upload_dir).await.map_err(Error::from)?;
        let path = upload_dir.join(format!("{job_id}.mp4"));
        tokio::fs::write(&path, &bytes).await.map_err(Error::from)?;

        tracing::info!(
            job_id = %job_id,
            file = %original_name,
            size = bytes.len(),
            "video uploaded"
        );

        ctx.orchestrator.spawn_with_id(job_id.clone(), path);

        return Ok(Json(UploadResponse {
            job_id,
            message: "Processing started",
        }));
    }

    Err(Error::Validation(format!("Missing multipart field '{VIDEO_FIELD}'")).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mp4_with_video_type_is_accepted() {
        assert!(validate_video(Some("clip.mp4"), Some("video/mp4")).is_ok());
        assert!(validate_video(Some("CLIP.MP4"), Some("video/quicktime")).is_ok());
    }

    #[test]
    fn other_extensions_are_rejected() {
        let err = validate_video(Some("clip.mov"), Some("video/quicktime")).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Only MP4 files are supported");
        assert!(validate_video(None, Some("video/mp4")).is_err());
    }

    #[test]
    fn non_video_content_type_is_rejected() {
        let err = validate_video(Some("clip.mp4"), Some("application/octet-stream")).unwrap_err();
        assert!(err.to_string().contains("Please upload a video file"));
        assert!(validate_video(Some("clip.mp4"), None).is_err());
    }
}
