use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion endpoint returned status {0}")]
    Status(u16),
    #[error("completion contained no content")]
    EmptyCompletion,
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
