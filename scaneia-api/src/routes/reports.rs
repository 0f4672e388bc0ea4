// ---------------------------------------------------------------------------
// Reports route: aggregated statistics
// ---------------------------------------------------------------------------

use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};
use scaneia_db::OwnerStatistics;

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::state::AppState;

/// Statistics for the reports page, computed server-side as indexed joins
/// instead of the old one-query-per-site fan-out.
pub async fn get_reports(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<OwnerStatistics>, ApiError> {
    let store = state.store.lock().await;
    let stats = store.owner_statistics(&session.user.id)?;
    Ok(Json(stats))
}
