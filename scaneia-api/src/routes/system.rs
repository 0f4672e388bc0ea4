// ---------------------------------------------------------------------------
// System routes: health check
// ---------------------------------------------------------------------------

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint — intentionally minimal to avoid leaking version or
/// account information to unauthenticated callers.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}
