//! Error types for Checkr

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Assertion program could not be resolved or bound.
    #[error("load failed: {spec} - {reason}")]
    LoadFailed { spec: String, reason: String },

    /// Completion backend failed or returned no usable message.
    #[error("backend error: {provider} - {message}")]
    Backend { provider: String, message: String },

    /// Clock misuse, unresolved symbols or stuck watchers inside the evaluator.
    #[error("evaluator error: {0}")]
    Evaluator(String),

    #[error("tool failed: {name} - {message}")]
    ToolFailed { name: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn load_failed(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            spec: spec.into(),
            reason: reason.into(),
        }
    }

    pub fn backend(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn tool_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// True for failures that end the current query but leave the agent usable.
    pub fn is_query_fatal(&self) -> bool {
        matches!(
            self,
            Self::Backend { .. } | Self::ToolFailed { .. } | Self::Evaluator(_)
        )
    }
}
