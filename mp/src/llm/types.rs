//! Request and response types for the generation service

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single prompt with a pinned response shape
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Natural-language prompt
    pub prompt: String,
    /// JSON schema the response text must follow
    pub response_schema: serde_json::Value,
    /// Upper bound on output tokens
    pub max_tokens: u32,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, response_schema: serde_json::Value, max_tokens: u32) -> Self {
        let prompt = prompt.into();
        debug!(prompt_len = prompt.len(), max_tokens, "GenerateRequest::new: called");
        Self {
            prompt,
            response_schema,
            max_tokens,
        }
    }
}

/// Token usage reported by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Raw result of one generation call
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Structured text payload, if the service produced any
    pub text: Option<String>,
    /// Why the service stopped, as reported ("STOP", "MAX_TOKENS", ...)
    pub finish_reason: Option<String>,
    pub usage: TokenUsage,
}

impl GenerateResponse {
    /// Response carrying only a text payload
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Response without any payload
    pub fn empty() -> Self {
        Self::default()
    }
}
