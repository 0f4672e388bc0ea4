// ---------------------------------------------------------------------------
// REST API server
// ---------------------------------------------------------------------------
//
// JSON backend for the ScaneIA frontend: accounts and sessions, site CRUD,
// the simulated scan workflow, reports, and log analysis.

pub mod auth;
pub mod error;
mod routes;
pub mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use scaneia_ai::{OpenAiClient, TextGenerator};
use scaneia_db::AppStore;
use scaneia_scan::EngineConfig;

use state::AppState;

/// Configuration for the API server.
pub struct ApiConfig {
    pub listen_addr: SocketAddr,
    /// SQLite database path; `None` uses the per-user default location.
    pub db_path: Option<PathBuf>,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub session_ttl: Duration,
}

/// Build the axum Router (useful for testing).
pub fn build_router(state: Arc<AppState>) -> axum::Router {
    routes::build_router(state)
}

/// Start the API server and block until shutdown (Ctrl+C).
pub async fn start_server(config: ApiConfig) -> anyhow::Result<()> {
    let store = match &config.db_path {
        Some(path) => AppStore::open(path)?,
        None => AppStore::open_default()?,
    };
    let generator: Arc<dyn TextGenerator> = Arc::new(OpenAiClient::new(
        config.openai_api_key,
        config.openai_base_url,
        config.openai_model,
    ));
    let state = Arc::new(AppState::new(
        store,
        generator,
        EngineConfig::default(),
        config.session_ttl,
    ));

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
