//! secretN - appends random lowercase letters to the input

use crate::registry::{str_arg, Tool, ToolResult};
use rand::Rng;
use serde_json::{json, Value};
use tracing::info;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

pub struct SecretTool {
    name: String,
    letters: usize,
}

impl SecretTool {
    pub fn new(name: impl Into<String>, letters: usize) -> Self {
        Self {
            name: name.into(),
            letters,
        }
    }
}

#[async_trait::async_trait]
impl Tool for SecretTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Compute a secret given an input string"
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
        let mut rng = rand::thread_rng();
        let suffix: String = (0..self.letters)
            .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
            .collect();
        let secret = format!("{}{}", input, suffix);
        info!("The secret of {} is {}", input, secret);
        ToolResult::text(secret)
    }
}
