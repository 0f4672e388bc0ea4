// ---------------------------------------------------------------------------
// Profile routes
// ---------------------------------------------------------------------------
//
// Email and password changes re-authenticate with the current password
// before touching anything, mirroring the identity provider's
// reauthenticate-then-update flow.

use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};
use scaneia_db::DbError;
use scaneia_types::User;
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::routes::auth::{
    EMAIL_IN_USE, INVALID_EMAIL, MIN_PASSWORD_LEN, PASSWORD_TOO_SHORT, hash_password,
    is_valid_email, verify_password,
};
use crate::state::AppState;

pub const WRONG_CURRENT_PASSWORD: &str = "Senha atual incorreta.";
/// The profile page's mismatch wording differs from the signup page's.
pub const NEW_PASSWORD_MISMATCH: &str = "As senhas não coincidem";

pub async fn get_profile(
    Extension(session): Extension<AuthSession>,
) -> Json<User> {
    Json(session.user)
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let store = state.store.lock().await;
    store.update_user_name(&session.user.id, &req.name)?;
    Ok(Json(User {
        name: req.name,
        ..session.user
    }))
}

/// Verify the caller's current password, for sensitive changes.
async fn reauthenticate(
    state: &AppState,
    user_id: &str,
    current_password: &str,
) -> Result<(), ApiError> {
    let stored = {
        let store = state.store.lock().await;
        store.password_hash(user_id)?
    };
    let Some(stored) = stored else {
        return Err(ApiError::Unauthorized(WRONG_CURRENT_PASSWORD.into()));
    };
    if !verify_password(current_password, &stored)? {
        return Err(ApiError::Unauthorized(WRONG_CURRENT_PASSWORD.into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmailRequest {
    pub email: String,
    pub current_password: String,
}

pub async fn update_email(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<UpdateEmailRequest>,
) -> Result<Json<User>, ApiError> {
    if !is_valid_email(&req.email) {
        return Err(ApiError::BadRequest(INVALID_EMAIL.into()));
    }
    reauthenticate(&state, &session.user.id, &req.current_password).await?;

    let store = state.store.lock().await;
    match store.update_user_email(&session.user.id, &req.email) {
        Ok(_) => {}
        Err(DbError::Conflict(_)) => return Err(ApiError::Conflict(EMAIL_IN_USE.into())),
        Err(e) => return Err(e.into()),
    }
    drop(store);

    info!(user_id = %session.user.id, "email updated");
    Ok(Json(User {
        email: req.email,
        ..session.user
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, serde::Serialize)]
pub struct UpdatePasswordResponse {
    pub updated: bool,
}

pub async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<UpdatePasswordResponse>, ApiError> {
    if req.new_password != req.confirm_password {
        return Err(ApiError::BadRequest(NEW_PASSWORD_MISMATCH.into()));
    }
    if req.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(PASSWORD_TOO_SHORT.into()));
    }
    reauthenticate(&state, &session.user.id, &req.current_password).await?;

    let password_hash = hash_password(&req.new_password)?;
    let store = state.store.lock().await;
    store.update_user_password(&session.user.id, &password_hash)?;
    drop(store);

    info!(user_id = %session.user.id, "password updated");
    Ok(Json(UpdatePasswordResponse { updated: true }))
}
