//! LlmClient trait definition

use async_trait::async_trait;

use super::{GenerateRequest, GenerateResponse, LlmError};

/// Stateless generation client - one request, one response
///
/// No conversation state and no streaming: each call stands alone and is
/// attempted exactly once.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt and wait for the complete response
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}
