use checkr_core::lifecycle;
use checkr_monitor::{Checkr, ObserverEvent};

/// The observer events an agent posts over a query's lifetime.
#[derive(Clone, Debug)]
pub struct LifecycleEvents {
    pub on_add_tool: ObserverEvent,
    pub on_add_instruction: ObserverEvent,
    pub on_query_received: ObserverEvent,
    pub on_query_analyzed: ObserverEvent,
    pub on_one_tool_called: ObserverEvent,
    pub on_all_tools_called: ObserverEvent,
    pub on_tool_calls_analyzed: ObserverEvent,
    pub on_query_handled: ObserverEvent,
}

impl LifecycleEvents {
    /// Define every lifecycle event in `checkr`'s registry.
    pub fn define(checkr: &Checkr) -> Self {
        Self {
            on_add_tool: checkr.define_observer_event(lifecycle::ON_ADD_TOOL),
            on_add_instruction: checkr.define_observer_event(lifecycle::ON_ADD_INSTRUCTION),
            on_query_received: checkr.define_observer_event(lifecycle::ON_QUERY_RECEIVED),
            on_query_analyzed: checkr.define_observer_event(lifecycle::ON_QUERY_ANALYZED),
            on_one_tool_called: checkr.define_observer_event(lifecycle::ON_ONE_TOOL_CALLED),
            on_all_tools_called: checkr.define_observer_event(lifecycle::ON_ALL_TOOLS_CALLED),
            on_tool_calls_analyzed: checkr
                .define_observer_event(lifecycle::ON_TOOL_CALLS_ANALYZED),
            on_query_handled: checkr.define_observer_event(lifecycle::ON_QUERY_HANDLED),
        }
    }
}
