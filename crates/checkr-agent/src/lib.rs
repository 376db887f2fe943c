//! Checkr Agent - a tool-using chat agent instrumented with lifecycle events

pub mod agent;
pub mod clock;
pub mod config;
pub mod events;

pub use agent::{CheckrAgent, ConversationState, TOOLS_INSTRUCTION};
pub use clock::{ClockMode, StepClock, TimeSource, WallClock};
pub use config::{AgentConfig, ClockConfig, ProviderConfig};
pub use events::LifecycleEvents;
