// ---------------------------------------------------------------------------
// Site CRUD routes
// ---------------------------------------------------------------------------

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use scaneia_db::AppStore;
use scaneia_types::{Scan, Site};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::state::{AppState, now_ms};

pub const INVALID_URL: &str =
    "Por favor, insira uma URL válida, incluindo http:// ou https://";

/// A site URL must be absolute, http(s), and name a host.
pub fn is_valid_site_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// Fetch a site and check it belongs to the caller. Absent → 404; someone
/// else's → 403.
pub fn fetch_owned_site(
    store: &AppStore,
    site_id: &str,
    owner_id: &str,
) -> Result<Site, ApiError> {
    let site = store
        .get_site(site_id)?
        .ok_or_else(|| ApiError::NotFound(format!("site not found: {site_id}")))?;
    if site.owner_id != owner_id {
        return Err(ApiError::Forbidden("site belongs to another account".into()));
    }
    Ok(site)
}

#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub url: String,
}

pub async fn create_site(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<CreateSiteRequest>,
) -> Result<(StatusCode, Json<Site>), ApiError> {
    // Validated before any AI call or store write.
    if !is_valid_site_url(&req.url) {
        return Err(ApiError::BadRequest(INVALID_URL.into()));
    }

    // The description is the generated risk summary. The prompt wrapper
    // swallows failures into a fallback string, so site creation never
    // fails on the AI path. The store lock is not held across this call.
    let description = scaneia_ai::analyze_url(state.generator.as_ref(), &req.url).await;

    let store = state.store.lock().await;
    let site = store.create_site(&session.user.id, &req.url, &description, now_ms())?;
    drop(store);

    info!(site_id = %site.id, user_id = %session.user.id, "site added");
    Ok((StatusCode::CREATED, Json(site)))
}

#[derive(Debug, Serialize)]
pub struct SiteListResponse {
    pub sites: Vec<Site>,
}

pub async fn list_sites(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<SiteListResponse>, ApiError> {
    let store = state.store.lock().await;
    let sites = store.list_sites(&session.user.id)?;
    Ok(Json(SiteListResponse { sites }))
}

pub async fn get_site(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Path(site_id): Path<String>,
) -> Result<Json<Site>, ApiError> {
    let store = state.store.lock().await;
    let site = fetch_owned_site(&store, &site_id, &session.user.id)?;
    Ok(Json(site))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSiteRequest {
    pub url: Option<String>,
    pub description: Option<String>,
}

pub async fn update_site(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Path(site_id): Path<String>,
    Json(req): Json<UpdateSiteRequest>,
) -> Result<Json<Site>, ApiError> {
    if let Some(ref url) = req.url
        && !is_valid_site_url(url)
    {
        return Err(ApiError::BadRequest(INVALID_URL.into()));
    }

    let store = state.store.lock().await;
    fetch_owned_site(&store, &site_id, &session.user.id)?;
    let site = store
        .update_site(
            &site_id,
            req.url.as_deref(),
            req.description.as_deref(),
            now_ms(),
        )?
        .ok_or_else(|| ApiError::NotFound(format!("site not found: {site_id}")))?;
    Ok(Json(site))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

pub async fn delete_site(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Path(site_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let store = state.store.lock().await;
    fetch_owned_site(&store, &site_id, &session.user.id)?;
    store.delete_site(&site_id)?;
    drop(store);

    info!(site_id = %site_id, "site deleted");
    Ok(Json(DeleteResponse { deleted: true }))
}

#[derive(Debug, Serialize)]
pub struct SiteScansResponse {
    pub scans: Vec<Scan>,
}

/// Scan history for one site, newest first.
pub async fn list_site_scans(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Path(site_id): Path<String>,
) -> Result<Json<SiteScansResponse>, ApiError> {
    let store = state.store.lock().await;
    fetch_owned_site(&store, &site_id, &session.user.id)?;
    let scans = store.list_scans_for_site(&site_id)?;
    Ok(Json(SiteScansResponse { scans }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(is_valid_site_url("https://example.com"));
        assert!(is_valid_site_url("http://example.com/path?q=1"));
        assert!(!is_valid_site_url("not a url"));
        assert!(!is_valid_site_url("example.com"));
        assert!(!is_valid_site_url("ftp://example.com"));
        assert!(!is_valid_site_url("https://"));
    }
}
