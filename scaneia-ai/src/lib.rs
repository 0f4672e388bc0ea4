//! Text-generation client for the ScaneIA service.
//!
//! Wraps three fixed prompts (URL risk summary, vulnerability report, log
//! analysis) around an OpenAI-compatible chat-completions endpoint.

mod client;
mod error;
mod prompts;

pub use client::{OpenAiClient, TextGenerator};
pub use error::AiError;
pub use prompts::{analyze_logs, analyze_url, generate_vulnerability_report};
