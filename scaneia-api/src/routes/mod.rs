// ---------------------------------------------------------------------------
// Route registration
// ---------------------------------------------------------------------------

mod auth;
mod logs;
mod profile;
mod reports;
mod scans;
mod sites;
mod system;

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Background maintenance: sweep finished scans from memory and expired
    // sessions from the database.
    scans::spawn_scan_sweep_task(state.clone());
    auth::spawn_session_purge_task(state.clone());

    let public_routes = Router::new()
        .route("/api/system/health", get(system::health_check))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login));

    let api_routes = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api/profile/email", put(profile::update_email))
        .route("/api/profile/password", put(profile::update_password))
        .route("/api/sites", post(sites::create_site).get(sites::list_sites))
        .route(
            "/api/sites/{id}",
            get(sites::get_site)
                .put(sites::update_site)
                .delete(sites::delete_site),
        )
        .route("/api/sites/{id}/scans", get(sites::list_site_scans))
        .route("/api/scans", post(scans::start_scan).get(scans::list_scans))
        .route("/api/scans/{id}", get(scans::get_scan))
        .route("/api/reports", get(reports::get_reports))
        .route("/api/logs", get(logs::list_logs))
        .route("/api/logs/analyze", post(logs::analyze_logs))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    // CORS: restrict to the localhost origins the frontend dev servers use.
    // When exposed to a network, put the API behind a reverse proxy that
    // handles CORS properly.
    let cors = CorsLayer::new()
        .allow_origin([
            // Next.js dev server
            axum::http::HeaderValue::from_static("http://localhost:3000"),
            axum::http::HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .max_age(std::time::Duration::from_secs(3600));

    public_routes
        .merge(api_routes)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(64 * 1024)) // request bodies are small
        .with_state(state)
}
