//! Reasoning capability seam
//!
//! The engine consumes natural-language reasoning through this trait only.
//! Failures surface as [`ReasoningError`]; the engine never retries with a
//! relaxed schema and never substitutes a cached or default response.

use serde_json::Value;

/// Reasoning call failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReasoningError {
    /// Provider unreachable or over capacity
    #[error("reasoning provider unavailable: {0}")]
    Unavailable(String),

    /// Provider answered with something that is not the requested structure
    #[error("reasoning provider returned malformed output: {0}")]
    Malformed(String),

    /// Provider refused the request
    #[error("reasoning call rejected: {0}")]
    Rejected(String),
}

/// One structured reasoning request
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub prompt: String,
    /// JSON Schema the structured response must satisfy
    pub response_schema: Value,
}

impl ReasoningRequest {
    /// Create a request
    #[must_use]
    pub fn new(prompt: impl Into<String>, response_schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema,
        }
    }
}

/// External reasoning collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReasoningCapability: Send + Sync {
    /// Produce a structured result for the request.
    ///
    /// Implementations must surface failures explicitly rather than
    /// degrading the response.
    async fn complete(&self, request: ReasoningRequest) -> Result<Value, ReasoningError>;
}
