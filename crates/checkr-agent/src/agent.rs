//! The tool-using agent and its per-query state machine
//!
//! Every transition of a query is posted to the agent's [`Checkr`] as a
//! lifecycle event, so loaded assertion programs observe the conversation
//! as it happens.

use crate::clock::TimeSource;
use crate::config::AgentConfig;
use crate::events::LifecycleEvents;
use checkr_core::{Error, Message, Payload, Result, ToolCall, ToolInvocation, ToolSpec};
use checkr_llm::{CompletionRequest, LlmProvider};
use checkr_monitor::{BoundProgram, Checkr, ObserverEvent};
use checkr_tools::{Tool, ToolRegistry, ToolResult};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// First system message of every conversation.
pub const TOOLS_INSTRUCTION: &str =
    "You are an agent with tools.  When calling a tool, make sure to match the type signature of the tool.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    Received,
    Analyzed,
    /// Dispatching the tool calls of the n-th completion that requested them.
    ToolRound(usize),
    Handled,
}

pub struct CheckrAgent {
    name: String,
    model: String,
    max_tool_rounds: usize,
    provider: Arc<dyn LlmProvider>,
    tools: ToolRegistry,
    checkr: Checkr,
    events: LifecycleEvents,
    clock: Arc<dyn TimeSource>,
    messages: Vec<Message>,
    final_text: Vec<String>,
    state: ConversationState,
}

impl CheckrAgent {
    /// An agent with its own checkr and the clock named in `config`.
    pub fn new(config: &AgentConfig, provider: Arc<dyn LlmProvider>) -> Result<Self> {
        Self::with_parts(config, provider, Checkr::new(), config.time_source())
    }

    /// Build around an existing checkr and time source, e.g. one whose
    /// evaluator is shared with other agents.
    pub fn with_parts(
        config: &AgentConfig,
        provider: Arc<dyn LlmProvider>,
        checkr: Checkr,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        let events = LifecycleEvents::define(&checkr);
        let mut agent = Self {
            name: config.name.clone(),
            model: config.model.clone(),
            max_tool_rounds: config.max_tool_rounds.max(1),
            provider,
            tools: ToolRegistry::new(),
            checkr,
            events,
            clock,
            messages: vec![Message::system(TOOLS_INSTRUCTION)],
            final_text: Vec::new(),
            state: ConversationState::Idle,
        };

        agent.add_instruction(&format!("Your NAME is {}.", config.name))?;
        if let Some(instruction) = &config.instruction {
            agent.add_instruction(instruction)?;
        }
        for spec in &config.assertions {
            agent.load_spec(spec)?;
        }
        Ok(agent)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Result lines of the most recent query.
    pub fn final_text(&self) -> &[String] {
        &self.final_text
    }

    pub fn checkr(&self) -> &Checkr {
        &self.checkr
    }

    pub fn events(&self) -> &LifecycleEvents {
        &self.events
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Tool specs sent to the backend with every completion.
    pub fn list_tools(&self) -> Vec<ToolSpec> {
        self.tools.specs()
    }

    pub fn load_spec(&self, spec: &str) -> Result<BoundProgram> {
        info!("LOADING THE ASSERTION {}", spec);
        Ok(self.checkr.load_spec(spec)?)
    }

    pub fn add_tool(&mut self, tool: impl Tool + 'static) -> Result<()> {
        self.add_tool_arc(Arc::new(tool))
    }

    /// Register a tool and define a predicate, named after it, that holds
    /// while the tool's flag is set.
    pub fn add_tool_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        self.tools.register_arc(tool);
        self.checkr.define_pred(&name);
        let event = self.events.on_add_tool.clone();
        self.post(&event, Payload::Tool(name))
    }

    pub fn add_instruction(&mut self, instruction: &str) -> Result<()> {
        self.messages.push(Message::system(instruction));
        let event = self.events.on_add_instruction.clone();
        self.post(&event, Payload::Instruction(instruction.to_string()))
    }

    /// Run one query to completion and return its result lines: each
    /// non-empty assistant text and one `Calling tool:` line per invocation.
    ///
    /// Backend failures, tool failures and evaluator errors end the query.
    /// The conversation keeps every message appended before the failure.
    pub async fn process_query(&mut self, query: &str) -> Result<Vec<String>> {
        let result = self.run_query(query).await;
        if result.is_err() {
            self.checkr.clear_all_flags();
        }
        self.state = ConversationState::Idle;
        result
    }

    async fn run_query(&mut self, query: &str) -> Result<Vec<String>> {
        debug!("Processing query");
        self.final_text.clear();
        self.messages.push(Message::user(query));
        self.state = ConversationState::Received;
        let ev = self.events.clone();
        self.post(&ev.on_query_received, Payload::Query(query.to_string()))?;

        let mut response = self.complete().await?;
        self.handle_response(&response);
        self.state = ConversationState::Analyzed;
        self.post(&ev.on_query_analyzed, Payload::Response(response.clone()))?;

        let mut round = 0;
        while response.has_tool_calls() {
            round += 1;
            if round > self.max_tool_rounds {
                return Err(Error::backend(
                    self.provider.name(),
                    format!("still requesting tools after {} rounds", self.max_tool_rounds),
                ));
            }
            self.state = ConversationState::ToolRound(round);

            for call in &response.tool_calls {
                self.checkr.set_flag(&call.name);
                if !self.call_tool(call).await? {
                    warn!("Tool '{}' not found", call.name);
                    self.messages.push(Message::tool_result(
                        &call.id,
                        &call.name,
                        format!("Tool '{}' not found", call.name),
                    ));
                }
            }

            self.post(&ev.on_all_tools_called, Payload::Empty)?;
            self.checkr.clear_all_flags();

            response = self.complete().await?;
            self.handle_response(&response);
            self.post(&ev.on_tool_calls_analyzed, Payload::Response(response.clone()))?;
        }

        self.state = ConversationState::Handled;
        self.post(&ev.on_query_handled, Payload::Empty)?;
        Ok(self.final_text.clone())
    }

    /// Invoke `call` if the tool exists. Returns false for an unknown tool.
    async fn call_tool(&mut self, call: &ToolCall) -> Result<bool> {
        let Some(tool) = self.tools.get(&call.name) else {
            return Ok(false);
        };
        let args = call
            .parse_arguments()
            .map_err(|e| Error::tool_failed(&call.name, format!("invalid arguments: {}", e)))?;

        info!("Invoking tool:{} with args:{}", call.name, args);
        let result = tool.execute(args.clone()).await;
        if let ToolResult::Error(e) = &result {
            return Err(Error::tool_failed(&call.name, e));
        }
        let content = result.to_content_string();
        info!("Got tool result:{}", content);

        self.final_text
            .push(format!("Calling tool:{} with args:{}", call.name, args));
        self.messages
            .push(Message::tool_result(&call.id, &call.name, content));

        let event = self.events.on_one_tool_called.clone();
        self.post(
            &event,
            Payload::ToolCalled(ToolInvocation::new(&call.name, args, result.to_value())),
        )?;
        Ok(true)
    }

    async fn complete(&self) -> Result<Message> {
        let request = CompletionRequest::new(&self.model, self.messages.clone(), self.tools.specs());
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| e.into_core(self.provider.name()))?;
        Ok(response.message)
    }

    fn handle_response(&mut self, message: &Message) {
        if let Some(text) = message.content.as_deref().filter(|t| !t.is_empty()) {
            self.final_text.push(text.to_string());
        }
        self.messages.push(message.clone());
    }

    fn post(&self, event: &ObserverEvent, payload: Payload) -> Result<()> {
        self.checkr
            .post_and_run_now(|| self.clock.now(), event, payload)?;
        Ok(())
    }

    /// Console loop on stdin/stdout until `quit` or end of input.
    pub async fn chat_loop(&mut self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.chat_loop_with(stdin, tokio::io::stdout()).await
    }

    /// Console loop over any line source and sink. Query failures are
    /// printed and the loop continues.
    pub async fn chat_loop_with<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Agent Started!");
        output
            .write_all(b"Type your queries or 'quit' to exit.\n")
            .await?;

        let mut lines = input.lines();
        loop {
            output.write_all(b"\nQuery: ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let query = line.trim();
            if query.eq_ignore_ascii_case("quit") {
                break;
            }
            if query.is_empty() {
                continue;
            }

            let reply = match self.process_query(query).await {
                Ok(lines) => format!("\n{}\n", lines.join("\n")),
                Err(e) => format!("\nError: {}\n", e),
            };
            output.write_all(reply.as_bytes()).await?;
        }
        output.flush().await?;
        Ok(())
    }
}
