//! Connection details for a browser participant joining a fresh room.

use crate::{api::ApiError, AppState};
use axum::extract::{Extension, Json};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ROOM_NAME_PREFIX: &str = "voice_assistant_room_";
pub const PARTICIPANT_NAME_PREFIX: &str = "voice_assistant_user_";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub server_url: String,
    pub room_name: String,
    pub participant_name: String,
    pub participant_token: String,
}

/// Handler for `POST /api/connection-details`.
///
/// Picks a random room and participant name and mints a join token for
/// them. Returns 503 when LiveKit is not configured.
pub async fn connection_details_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ConnectionDetails>, ApiError> {
    let voice = state
        .voice_service
        .as_ref()
        .filter(|v| v.is_enabled())
        .ok_or_else(|| {
            ApiError::ServiceUnavailable(
                "LiveKit is not configured; set livekit.url, livekit.api_key and livekit.api_secret"
                    .to_string(),
            )
        })?;

    let (room_name, participant_name) = {
        let mut rng = rand::thread_rng();
        (
            format!("{}{}", ROOM_NAME_PREFIX, rng.gen_range(0..10_000)),
            format!("{}{}", PARTICIPANT_NAME_PREFIX, rng.gen_range(0..10_000)),
        )
    };

    let participant_token = voice
        .generate_join_token(&room_name, &participant_name, &participant_name)
        .map_err(|e| {
            tracing::error!("failed to generate LiveKit token: {}", e);
            ApiError::InternalServerError("Failed to generate voice token".to_string())
        })?;

    tracing::info!(room = %room_name, participant = %participant_name, "issued connection details");

    Ok(Json(ConnectionDetails {
        server_url: voice.get_url().to_string(),
        room_name,
        participant_name,
        participant_token,
    }))
}
