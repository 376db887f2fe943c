//! Request and response types for chat completion

use checkr_core::{Message, ToolSpec};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            messages: Vec::new(),
            tools: Vec::new(),
            max_tokens: None,
            temperature: None,
        }
    }
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, tools: Vec<ToolSpec>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools,
            ..Default::default()
        }
    }
}

/// The first choice of a completion.
#[derive(Clone, Debug)]
pub struct CompletionResponse {
    pub message: Message,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            finish_reason: None,
            usage: None,
        }
    }
}

/// Token usage
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}
