//! Language model service abstraction.
//!
//! The hosted text-generation service is an external collaborator. Implementations
//! report transport failures either as `Err` or, following the service contract, as a
//! response equal to or containing [`ERROR_SENTINEL`]. Callers treat both as failure.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ChatRequest;

/// Literal returned in place of generated text when the upstream call fails.
pub const ERROR_SENTINEL: &str = "[LLMClient] ERROR";

/// Lowercased name carried inside the sentinel.
pub const SENTINEL_NAME: &str = "llmclient";

/// Text-generation service consumed by the classifiers.
#[async_trait]
pub trait LanguageModelService: Send + Sync {
    /// Sends role-tagged messages and returns the generated text.
    async fn chat(&self, request: ChatRequest) -> Result<String>;

    /// Model used when a request carries no override.
    fn default_model(&self) -> &str;
}

/// Returns true when a response is, or carries, the service error sentinel.
pub fn is_error_response(response: &str) -> bool {
    response.contains(ERROR_SENTINEL) || response.to_lowercase().contains(SENTINEL_NAME)
}
