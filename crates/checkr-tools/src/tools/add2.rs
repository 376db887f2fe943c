//! add2 - integer arithmetic, returns JSON

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};

pub struct Add2Tool;

/// Accepts integers and numeric strings, since models often quote numbers.
fn int_arg(args: &Value, key: &str) -> Option<i64> {
    match args.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait::async_trait]
impl Tool for Add2Tool {
    fn name(&self) -> &str {
        "add2"
    }

    fn description(&self) -> &str {
        "Add 2 to the argument and return the result."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "val": { "type": "integer" }
            },
            "required": ["val"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        match int_arg(&args, "val") {
            Some(val) => match val.checked_add(2) {
                Some(sum) => ToolResult::Json(json!(sum)),
                None => ToolResult::error(format!("{} + 2 overflows a 64-bit integer", val)),
            },
            None => ToolResult::error("missing integer argument 'val'"),
        }
    }
}
