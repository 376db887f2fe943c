//! OpenAI-compatible chat completions provider

use crate::provider::{LlmError, LlmProvider, LlmResult};
use crate::types::{CompletionRequest, CompletionResponse, Usage};
use checkr_core::{Message, Role, ToolCall};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Speaks the `/chat/completions` wire format. Any server that implements it
/// (OpenAI, Ollama, vLLM, LiteLLM proxies) can sit behind `base_url`.
pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout_secs: u64,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            base_url: OPENAI_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// For local servers that take no key.
    pub fn anonymous() -> Self {
        Self {
            api_key: None,
            ..Self::new("")
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let body = ChatRequest::from(&request);
        debug!(
            "chat request: model={} messages={} tools={}",
            body.model,
            body.messages.len(),
            body.tools.as_ref().map_or(0, Vec::len)
        );

        let mut builder = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body);
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout_secs)
            } else {
                LlmError::NetworkError(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("chat completion error {}: {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthFailed(error_text),
                429 => LlmError::RateLimited {
                    retry_after_ms: 60000,
                },
                _ => LlmError::RequestFailed(format!("{}: {}", status, error_text)),
            });
        }

        let text = response.text().await?;
        parse_response(&text)
    }
}

/// Decode a chat completion body into its first choice.
pub fn parse_response(text: &str) -> LlmResult<CompletionResponse> {
    let parsed: ChatResponse =
        serde_json::from_str(text).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("response has no choices".into()))?;
    let message = choice
        .message
        .ok_or_else(|| LlmError::InvalidResponse("first choice has no message".into()))?;

    Ok(CompletionResponse {
        message: message.into(),
        finish_reason: choice.finish_reason,
        usage: parsed.usage,
    })
}

// -- wire format --

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl From<&CompletionRequest> for ChatRequest {
    fn from(request: &CompletionRequest) -> Self {
        let tools = (!request.tools.is_empty()).then(|| {
            request
                .tools
                .iter()
                .map(|t| WireTool {
                    kind: "function".into(),
                    function: WireFunction {
                        name: t.name.clone(),
                        description: Some(t.description.clone()),
                        parameters: Some(t.parameters.clone()),
                    },
                })
                .collect()
        });
        Self {
            model: request.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tools,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<&Message> for WireMessage {
    fn from(m: &Message) -> Self {
        let tool_calls = m.has_tool_calls().then(|| {
            m.tool_calls
                .iter()
                .map(|c| WireToolCall {
                    id: c.id.clone(),
                    kind: "function".into(),
                    function: WireCall {
                        name: c.name.clone(),
                        arguments: c.arguments.clone(),
                    },
                })
                .collect()
        });
        Self {
            role: m.role,
            content: m.content.clone(),
            tool_calls,
            tool_call_id: m.tool_call_id.clone(),
            name: m.name.clone(),
        }
    }
}

impl From<WireMessage> for Message {
    fn from(w: WireMessage) -> Self {
        let calls = w
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|c| ToolCall::new(c.id, c.function.name, c.function.arguments))
            .collect::<Vec<_>>();
        let mut message = Message::assistant_with_tools(w.content, calls);
        message.role = w.role;
        message.tool_call_id = w.tool_call_id;
        message.name = w.name;
        message
    }
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize)]
struct WireFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireCall,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Serialize, Deserialize)]
struct WireCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<WireMessage>,
    finish_reason: Option<String>,
}
