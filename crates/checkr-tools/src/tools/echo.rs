//! echo - returns its argument

use crate::registry::{str_arg, Tool, ToolResult};
use serde_json::{json, Value};
use tracing::info;

pub struct EchoTool;

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "This tool returns its argument as an echo"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "type": "string" }
            },
            "required": ["input"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let input = match str_arg(&args, "input") {
            Ok(s) => s,
            Err(e) => return e,
        };
        info!("Echoing {}", input);
        ToolResult::text(format!("Echoed Output is {}", input))
    }
}
