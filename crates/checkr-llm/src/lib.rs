//! Checkr LLM - chat-completion backends for the agent

pub mod openai;
pub mod provider;
pub mod scripted;
pub mod types;

pub use openai::OpenAiProvider;
pub use provider::{LlmError, LlmProvider, LlmResult};
pub use scripted::{ScriptedBehavior, ScriptedProvider};
pub use types::*;
