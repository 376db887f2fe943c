//! Checkr Tools - callable tools handed to the agent
//!
//! Each demo tool is a self-contained file in src/tools/.
//! To add a tool: create the file, implement the Tool trait, register below.

pub mod registry;
pub mod tools;

pub use registry::{FnTool, Tool, ToolRegistry, ToolResult};

/// Registry with the console demo tools: `echo`, `add2`, `secret1`, `secret2`.
pub fn create_demo_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in demo_tools() {
        registry.register_arc(tool);
    }
    registry
}

/// The demo tools in registration order.
pub fn demo_tools() -> Vec<std::sync::Arc<dyn Tool>> {
    vec![
        std::sync::Arc::new(tools::echo::EchoTool),
        std::sync::Arc::new(tools::add2::Add2Tool),
        std::sync::Arc::new(tools::secret::SecretTool::new("secret1", 2)),
        std::sync::Arc::new(tools::secret::SecretTool::new("secret2", 3)),
    ]
}
