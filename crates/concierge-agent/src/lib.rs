//! Agents, tools, delegation, and the runner that ties them to a session.
//!
//! An [`Agent`] queries its model, invokes tools from its [`ToolRegistry`],
//! and may hand the conversation to one of its children. A [`Runner`] binds
//! a root agent to a [`concierge_sessions::SessionStore`] and streams
//! [`RunEvent`]s for each user message.

pub mod agent;
pub mod cancel;
pub mod config;
pub mod decision;
pub mod errors;
pub mod events;
mod prompt;
pub mod runner;
pub mod tools;

pub use agent::{AGENT_METADATA_KEY, Agent, AgentBuilder, RunContext};
pub use cancel::RunCancellation;
pub use config::RunConfig;
pub use decision::{AgentState, Decision};
pub use errors::{AgentError, ToolError};
pub use events::{RunEvent, RunEventStream, ToolInvocation, ToolOutcome};
pub use runner::Runner;
pub use tools::{
    RegisteredTool, TRANSFER_TOOL, ToolContext, ToolExecutor, ToolFuture, ToolRegistry,
    function_tool, parse_tool_arguments, schema_for_arguments, transfer_tool_definition,
};
