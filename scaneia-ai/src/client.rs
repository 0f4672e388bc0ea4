use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::AiError;

/// Sampling temperature used for every prompt.
const TEMPERATURE: f64 = 0.7;

/// Seam between the prompt wrappers and the completion endpoint. Object-safe
/// so the scan workflow and tests can substitute deterministic generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one chat completion and return the generated text.
    ///
    /// A completion that comes back without content (no choices, or an empty
    /// message) is [`AiError::EmptyCompletion`].
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, AiError>;
}

/// Response subset of `POST {base_url}/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// `base_url` is the API root (e.g. `https://api.openai.com/v1`);
    /// `/chat/completions` is appended per request. No timeout is configured
    /// beyond the transport default.
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let body = json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "max_tokens": max_tokens,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AiError::Status(resp.status().as_u16()));
        }

        let data: ChatCompletionResponse = resp.json().await?;
        data.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyCompletion)
    }
}
