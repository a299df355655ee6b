//! Coachroom server library logic.

pub mod api;
pub mod api_session;
pub mod api_summary;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use coachroom_summary::SummaryExtractor;
use coachroom_voice::{BroadcastPublisher, VoiceService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
pub struct AppState {
    /// Turns uploaded documents into summaries.
    pub extractor: SummaryExtractor,
    /// Sends summaries into rooms. `None` when LiveKit is not configured.
    pub publisher: Option<BroadcastPublisher>,
    /// Join tokens for browser participants. `None` when LiveKit is not
    /// configured.
    pub voice_service: Option<Arc<VoiceService>>,
    /// Maximum request body size for uploads.
    pub max_body_bytes: usize,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/connection-details",
            post(api_session::connection_details_handler),
        )
        .route("/api/process-cv", post(api_summary::process_cv_handler))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
