//! LLM Provider trait

use crate::types::{CompletionRequest, CompletionResponse};

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// LLM error types
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl LlmError {
    /// Convert into the workspace error, tagged with the provider name.
    pub fn into_core(self, provider: &str) -> checkr_core::Error {
        checkr_core::Error::backend(provider, self.to_string())
    }
}

/// A chat-completion backend.
///
/// The agent hands over the whole conversation and the tool list on every
/// call and expects exactly one assistant message back.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse>;
}
