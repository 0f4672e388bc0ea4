// ---------------------------------------------------------------------------
// Log routes: listing and AI analysis
// ---------------------------------------------------------------------------

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::{Extension, Json};
use scaneia_types::LogEntry;
use serde::{Deserialize, Serialize};

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::state::AppState;

const MAX_PAGE_SIZE: usize = 200;

/// How many recent entries the analysis prompt sees.
const ANALYSIS_WINDOW: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListLogsResponse {
    pub logs: Vec<LogEntry>,
}

/// The caller's newest log entries. Messages name the caller's sites, so the
/// listing is owner-scoped like every other read path.
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<ListLogsQuery>,
) -> Result<Json<ListLogsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(50).min(MAX_PAGE_SIZE);
    let store = state.store.lock().await;
    let logs = store.list_logs(&session.user.id, limit)?;
    Ok(Json(ListLogsResponse { logs }))
}

#[derive(Debug, Serialize)]
pub struct LogAnalysisResponse {
    pub analysis: String,
}

/// Run the log-analysis prompt over the caller's most recent entries. The
/// prompt wrapper swallows failures into a fallback string, so this never
/// errors on the AI path.
pub async fn analyze_logs(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<LogAnalysisResponse>, ApiError> {
    let logs = {
        let store = state.store.lock().await;
        store.list_logs(&session.user.id, ANALYSIS_WINDOW)?
    };
    let analysis = scaneia_ai::analyze_logs(state.generator.as_ref(), &logs).await;
    Ok(Json(LogAnalysisResponse { analysis }))
}
