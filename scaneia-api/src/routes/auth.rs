// ---------------------------------------------------------------------------
// Account routes: signup, login, logout
// ---------------------------------------------------------------------------

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use scaneia_db::DbError;
use scaneia_types::User;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::state::{AppState, hash_token, now_ms};

pub const PASSWORD_MISMATCH: &str = "As senhas não conferem.";
pub const PASSWORD_TOO_SHORT: &str = "A senha deve ter pelo menos 6 caracteres.";
pub const INVALID_EMAIL: &str = "E-mail inválido.";
pub const EMAIL_IN_USE: &str = "Este e-mail já está em uso.";
pub const BAD_CREDENTIALS: &str = "E-mail ou senha incorretos.";

pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimal structural check, matching what the identity provider rejected
/// as `auth/invalid-email`.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(format!("stored password hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Mint a fresh opaque session token. Returns `(plaintext, stored hash)`.
pub fn new_session_token() -> (String, String) {
    let token = format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );
    let token_hash = hash_token(&token);
    (token, token_hash)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    // Validation order is part of the product surface: mismatch, then
    // length, then email shape — all before any store write.
    if req.password != req.confirm_password {
        return Err(ApiError::BadRequest(PASSWORD_MISMATCH.into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(PASSWORD_TOO_SHORT.into()));
    }
    if !is_valid_email(&req.email) {
        return Err(ApiError::BadRequest(INVALID_EMAIL.into()));
    }

    let password_hash = hash_password(&req.password)?;
    let now = now_ms();

    let store = state.store.lock().await;
    let user = match store.create_user(&req.name, &req.email, &password_hash, now) {
        Ok(user) => user,
        Err(DbError::Conflict(_)) => return Err(ApiError::Conflict(EMAIL_IN_USE.into())),
        Err(e) => return Err(e.into()),
    };

    let (token, token_hash) = new_session_token();
    store.create_session(
        &token_hash,
        &user.id,
        now,
        now + state.session_ttl.as_millis() as u64,
    )?;
    drop(store);

    info!(user_id = %user.id, "account created");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let store = state.store.lock().await;
    let creds = store.credentials_by_email(&req.email)?;

    // Unknown email and wrong password both collapse to one message.
    let Some(creds) = creds else {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    };
    if !verify_password(&req.password, &creds.password_hash)? {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let now = now_ms();
    let (token, token_hash) = new_session_token();
    store.create_session(
        &token_hash,
        &creds.user.id,
        now,
        now + state.session_ttl.as_millis() as u64,
    )?;
    drop(store);

    info!(user_id = %creds.user.id, "login");
    Ok(Json(AuthResponse {
        token,
        user: creds.user,
    }))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<LogoutResponse>, ApiError> {
    let store = state.store.lock().await;
    store.delete_session(&session.token_hash)?;
    Ok(Json(LogoutResponse { logged_out: true }))
}

/// Interval between expired-session purge runs.
const SESSION_PURGE_INTERVAL_SECS: u64 = 3600;

/// Spawns a single background task that deletes expired sessions.
pub fn spawn_session_purge_task(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
            SESSION_PURGE_INTERVAL_SECS,
        ));
        loop {
            interval.tick().await;
            let store = state.store.lock().await;
            match store.purge_expired_sessions(now_ms()) {
                Ok(0) => {}
                Ok(n) => info!(purged = n, "expired sessions removed"),
                Err(e) => warn!(error = %e, "session purge failed"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.com"));
        assert!(!is_valid_email("ana"));
        assert!(!is_valid_email("ana@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana@.com"));
        assert!(!is_valid_email("ana @example.com"));
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("senha-secreta").unwrap();
        assert!(verify_password("senha-secreta", &hash).unwrap());
        assert!(!verify_password("outra-senha", &hash).unwrap());
    }

    #[test]
    fn session_tokens_are_unique() {
        let (token_a, hash_a) = new_session_token();
        let (token_b, hash_b) = new_session_token();
        assert_ne!(token_a, token_b);
        assert_ne!(hash_a, hash_b);
        assert_eq!(hash_a, hash_token(&token_a));
    }
}
