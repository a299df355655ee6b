//! Coachroom server binary.
//!
//! Starts an axum HTTP server with structured logging and graceful shutdown
//! on SIGTERM/SIGINT.

use coachroom_server::{app, config, AppState};
use coachroom_summary::{AnthropicClient, SummaryExtractor};
use coachroom_voice::{BroadcastPublisher, VoiceService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("COACHROOM_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration: the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Summary extraction
    if !config.summary.is_enabled() {
        tracing::warn!("summary.api_key is not set; CV uploads will fail until ANTHROPIC_API_KEY is configured");
    }
    let generator = AnthropicClient::new(&config.summary)
        .expect("failed to build HTTP client for the text generation service");
    let extractor = SummaryExtractor::new(Arc::new(generator), &config.summary);

    // Room access
    let (voice_service, publisher) = if config.livekit.is_enabled() {
        let voice_service = Arc::new(VoiceService::new(config.livekit.clone()));
        tracing::info!(url = %voice_service.get_url(), "LiveKit configured");
        let publisher = BroadcastPublisher::new(voice_service.clone());
        (Some(voice_service), Some(publisher))
    } else {
        tracing::warn!(
            "LiveKit is not configured; connection details and summary broadcast are disabled"
        );
        (None, None)
    };

    let state = AppState {
        extractor,
        publisher,
        voice_service,
        max_body_bytes: config.upload.max_body_bytes,
    };

    // Build application
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting coachroom server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("coachroom server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
