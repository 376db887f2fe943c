//! Event payloads
//!
//! Every lifecycle event carries one of these variants. The variant is fixed
//! per event kind:
//!
//! | event                                         | payload        |
//! |-----------------------------------------------|----------------|
//! | `on_add_tool`                                 | `Tool`         |
//! | `on_add_instruction`                          | `Instruction`  |
//! | `on_query_received`                           | `Query`        |
//! | `on_query_analyzed`, `on_tool_calls_analyzed` | `Response`     |
//! | `on_one_tool_called`                          | `ToolCalled`   |
//! | `on_all_tools_called`, `on_query_handled`     | `Empty`        |

use crate::types::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One resolved tool invocation: `(name, args, result)`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub args: Value,
    pub result: Value,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, args: Value, result: Value) -> Self {
        Self {
            name: name.into(),
            args,
            result,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    #[default]
    Empty,
    Tool(String),
    Instruction(String),
    Query(String),
    Response(Message),
    ToolCalled(ToolInvocation),
    /// Free-form payload for events defined outside the agent lifecycle.
    Value(Value),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Text carried by `Tool`, `Instruction` and `Query` payloads.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Tool(s) | Payload::Instruction(s) | Payload::Query(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&Message> {
        match self {
            Payload::Response(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_tool_called(&self) -> Option<&ToolInvocation> {
        match self {
            Payload::ToolCalled(t) => Some(t),
            _ => None,
        }
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Empty => f.write_str("None"),
            Payload::Tool(s) | Payload::Instruction(s) | Payload::Query(s) => f.write_str(s),
            Payload::Response(m) => {
                write!(f, "{}: {}", m.role, m.text())?;
                for tc in &m.tool_calls {
                    write!(f, " [{}({})]", tc.name, tc.arguments)?;
                }
                Ok(())
            }
            Payload::ToolCalled(t) => write!(f, "({}, {}, {})", t.name, t.args, t.result),
            Payload::Value(v) => write!(f, "{}", v),
        }
    }
}
