//! Plan generation
//!
//! Turns one board URL into one `ActionPlan` through exactly one call to the
//! generation service. The response is pinned to a JSON schema on the way
//! out and checked structurally on the way back: a payload that is missing,
//! malformed, or missing a required field is a failure, never a partial plan.

mod prompt;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::ActionPlan;
use crate::llm::{GenerateRequest, LlmClient, LlmError};

pub use prompt::{build_prompt, response_schema};

/// Default output token budget for one plan
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Why a plan could not be produced
#[derive(Debug, Error)]
pub enum PlanError {
    /// The service answered without a text payload
    #[error("No response from AI")]
    EmptyResponse,

    /// The payload was not valid JSON or did not have the ActionPlan shape
    #[error("Invalid AI response format: {reason}")]
    InvalidFormat { reason: String },

    /// The call itself failed (network, API, configuration)
    #[error("Generation service failed: {0}")]
    Service(#[from] LlmError),
}

impl PlanError {
    /// True for failures detected while reading the payload
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, PlanError::InvalidFormat { .. })
    }
}

/// Plan Generation Adapter
#[derive(Clone)]
pub struct PlanGenerator {
    llm: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        debug!(model = %llm.model(), "PlanGenerator::new: called");
        Self {
            llm,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Build the outbound request for a board URL
    pub fn build_request(&self, board_url: &str) -> GenerateRequest {
        GenerateRequest::new(build_prompt(board_url), response_schema(), self.max_tokens)
    }

    /// Generate a plan for a board URL
    ///
    /// One attempt; any failure is returned to the caller.
    pub async fn generate(&self, board_url: &str) -> Result<ActionPlan, PlanError> {
        debug!(%board_url, "PlanGenerator::generate: called");
        let request = self.build_request(board_url);
        let response = self.llm.generate(request).await?;

        debug!(
            finish_reason = ?response.finish_reason,
            tokens = response.usage.total(),
            "PlanGenerator::generate: response received"
        );

        let text = response.text.unwrap_or_default();
        let plan = parse_plan(&text)?;
        info!(
            goal = %plan.goal,
            days = plan.weekly_plan.len(),
            "Generated plan"
        );
        Ok(plan)
    }
}

/// Parse and validate a payload into an ActionPlan
///
/// Malformed JSON and a well-formed value of the wrong shape are both
/// `InvalidFormat`. The raw payload goes to the log only.
pub fn parse_plan(text: &str) -> Result<ActionPlan, PlanError> {
    debug!(text_len = text.len(), "parse_plan: called");
    if text.trim().is_empty() {
        debug!("parse_plan: empty payload");
        return Err(PlanError::EmptyResponse);
    }

    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        warn!(error = %e, payload = %text, "Failed to parse AI response");
        PlanError::InvalidFormat {
            reason: format!("malformed JSON: {}", e),
        }
    })?;

    serde_json::from_value::<ActionPlan>(value).map_err(|e| {
        warn!(error = %e, payload = %text, "AI response does not match the plan shape");
        PlanError::InvalidFormat {
            reason: format!("shape mismatch: {}", e),
        }
    })
}
