//! Names of the events an agent emits over its lifetime

pub const ON_ADD_TOOL: &str = "on_add_tool";
pub const ON_ADD_INSTRUCTION: &str = "on_add_instruction";

pub const ON_QUERY_RECEIVED: &str = "on_query_received";
pub const ON_QUERY_ANALYZED: &str = "on_query_analyzed";
pub const ON_ONE_TOOL_CALLED: &str = "on_one_tool_called";
pub const ON_ALL_TOOLS_CALLED: &str = "on_all_tools_called";
pub const ON_TOOL_CALLS_ANALYZED: &str = "on_tool_calls_analyzed";
pub const ON_QUERY_HANDLED: &str = "on_query_handled";

/// Every lifecycle event, setup events first.
pub const ALL: [&str; 8] = [
    ON_ADD_TOOL,
    ON_ADD_INSTRUCTION,
    ON_QUERY_RECEIVED,
    ON_QUERY_ANALYZED,
    ON_ONE_TOOL_CALLED,
    ON_ALL_TOOLS_CALLED,
    ON_TOOL_CALLS_ANALYZED,
    ON_QUERY_HANDLED,
];
