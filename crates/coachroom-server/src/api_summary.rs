//! CV upload: summarise the document and share the summary with the room.

use crate::{api::ApiError, AppState};
use axum::extract::{Extension, Json, Multipart};
use coachroom_summary::ValidationError;
use coachroom_types::{Artifact, Audience};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessCvResponse {
    pub success: bool,
    pub summary: String,
}

struct Upload {
    data: axum::body::Bytes,
    content_type: String,
}

/// Handler for `POST /api/process-cv`.
///
/// Multipart fields: `file` (the document) and optional `roomName`. The
/// summary is returned whether or not the room broadcast succeeds.
pub async fn process_cv_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ProcessCvResponse>, ApiError> {
    let mut upload: Option<Upload> = None;
    let mut room_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
                upload = Some(Upload { data, content_type });
            }
            "roomName" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("invalid roomName: {}", e)))?;
                let text = text.trim();
                room_name = (!text.is_empty()).then(|| text.to_string());
            }
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest(ValidationError::Empty.to_string()))?;
    tracing::info!(
        bytes = upload.data.len(),
        content_type = %upload.content_type,
        room = room_name.as_deref().unwrap_or("<none>"),
        "processing CV upload"
    );

    let artifact = state
        .extractor
        .extract(&upload.data, &upload.content_type)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "CV processing failed");
            ApiError::from(e)
        })?;

    if let Some(room) = room_name.as_deref() {
        broadcast(&state, room, &artifact).await;
    }

    Ok(Json(ProcessCvResponse {
        success: true,
        summary: artifact.payload().to_string(),
    }))
}

/// Best-effort: failures are logged and never reach the HTTP response.
async fn broadcast(state: &AppState, room: &str, artifact: &Artifact) {
    let Some(publisher) = state.publisher.as_ref() else {
        tracing::warn!(room, "room broadcast skipped: LiveKit is not configured");
        return;
    };
    if let Err(e) = publisher.publish(room, artifact, &Audience::All).await {
        tracing::warn!(room, error = %e, "failed to broadcast CV summary to room");
    }
}
