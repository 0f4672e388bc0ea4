// ---------------------------------------------------------------------------
// Session authentication middleware
// ---------------------------------------------------------------------------

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use scaneia_types::User;

use crate::error::ApiErrorBody;
use crate::state::{AppState, hash_token, now_ms};

/// The authenticated caller, inserted as a request extension by
/// [`auth_middleware`]. Carries the session's token hash so logout can
/// revoke exactly the session that made the request.
#[derive(Clone)]
pub struct AuthSession {
    pub user: User,
    pub token_hash: String,
}

/// Middleware that resolves the `Authorization: Bearer <token>` header to a
/// live session. Tokens are hashed before lookup; expired sessions resolve
/// the same as unknown ones.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiErrorBody>)> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        Some(_) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiErrorBody {
                    error: "invalid_scheme".into(),
                    message: "Expected 'Bearer <token>' authorization".into(),
                }),
            ));
        }
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiErrorBody {
                    error: "missing_token".into(),
                    message: "Authorization header required".into(),
                }),
            ));
        }
    };

    let token_hash = hash_token(token);
    let resolved = {
        let store = state.store.lock().await;
        store.session_user(&token_hash, now_ms())
    };

    match resolved {
        Ok(Some(user)) => {
            request
                .extensions_mut()
                .insert(AuthSession { user, token_hash });
            Ok(next.run(request).await)
        }
        Ok(None) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiErrorBody {
                error: "invalid_token".into(),
                message: "Invalid or expired session".into(),
            }),
        )),
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorBody {
                    error: "internal_error".into(),
                    message: "internal server error".into(),
                }),
            ))
        }
    }
}
