//! Deterministic provider for offline runs and tests
//!
//! Each call to `complete` pops the next behavior. Once the script is
//! exhausted the fallback behavior is replayed.

use crate::provider::{LlmError, LlmProvider, LlmResult};
use crate::types::{CompletionRequest, CompletionResponse};
use checkr_core::{Message, ToolCall};
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::Mutex;

#[derive(Clone, Debug)]
pub enum ScriptedBehavior {
    /// Plain assistant text
    Text(String),
    /// One tool call with the given arguments
    ToolCall { name: String, args: Value },
    /// Several tool calls in one message
    MultiToolCall(Vec<(String, Value)>),
    /// Text alongside a tool call
    TextThenTool {
        text: String,
        tool_name: String,
        tool_args: Value,
    },
    /// A tool call whose argument string is passed through verbatim
    RawArguments { name: String, arguments: String },
    /// Backend failure
    Error(String),
    /// A response with no choices
    Empty,
}

impl ScriptedBehavior {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn tool(name: impl Into<String>, args: Value) -> Self {
        Self::ToolCall {
            name: name.into(),
            args,
        }
    }
}

pub struct ScriptedProvider {
    behaviors: Mutex<VecDeque<ScriptedBehavior>>,
    fallback: ScriptedBehavior,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    /// Always answer with the same behavior.
    pub fn constant(behavior: ScriptedBehavior) -> Self {
        Self {
            behaviors: Mutex::new(VecDeque::new()),
            fallback: behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer with `behaviors` in order.
    pub fn sequence(behaviors: Vec<ScriptedBehavior>) -> Self {
        Self {
            behaviors: Mutex::new(behaviors.into()),
            fallback: ScriptedBehavior::text("(scripted: sequence exhausted)"),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replays whatever the last user message said.
    pub fn echo() -> Self {
        Self::constant(ScriptedBehavior::Text(String::new()))
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_behavior(&self) -> ScriptedBehavior {
        self.behaviors
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

fn call_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("call_{}", &id[..12])
}

fn call(name: String, args: &Value) -> ToolCall {
    ToolCall::new(call_id(), name, args.to_string())
}

fn last_user_text(request: &CompletionRequest) -> String {
    request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == checkr_core::Role::User)
        .map(|m| m.text().to_string())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let behavior = self.next_behavior().await;
        let echo = last_user_text(&request);
        self.requests.lock().await.push(request);

        let message = match behavior {
            ScriptedBehavior::Text(text) if text.is_empty() => Message::assistant(echo),
            ScriptedBehavior::Text(text) => Message::assistant(text),
            ScriptedBehavior::ToolCall { name, args } => {
                Message::assistant_with_tools(None, vec![call(name, &args)])
            }
            ScriptedBehavior::MultiToolCall(calls) => Message::assistant_with_tools(
                None,
                calls
                    .into_iter()
                    .map(|(name, args)| call(name, &args))
                    .collect(),
            ),
            ScriptedBehavior::TextThenTool {
                text,
                tool_name,
                tool_args,
            } => Message::assistant_with_tools(Some(text), vec![call(tool_name, &tool_args)]),
            ScriptedBehavior::RawArguments { name, arguments } => {
                Message::assistant_with_tools(None, vec![ToolCall::new(call_id(), name, arguments)])
            }
            ScriptedBehavior::Error(e) => return Err(LlmError::RequestFailed(e)),
            ScriptedBehavior::Empty => {
                return Err(LlmError::InvalidResponse("response has no choices".into()))
            }
        };

        let finish_reason = if message.has_tool_calls() {
            "tool_calls"
        } else {
            "stop"
        };
        Ok(CompletionResponse {
            finish_reason: Some(finish_reason.to_string()),
            ..CompletionResponse::new(message)
        })
    }
}
