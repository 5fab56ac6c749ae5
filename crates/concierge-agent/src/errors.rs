use thiserror::Error;

/// Failures raised by the tool registry and typed tool construction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("duplicate tool name: {0}")]
    DuplicateToolName(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for tool '{tool}': {message}")]
    SchemaValidation { tool: String, message: String },
    #[error("tool '{tool}' failed: {message}")]
    Handler { tool: String, message: String },
    #[error("invalid schema for tool '{tool}': {message}")]
    InvalidSchema { tool: String, message: String },
}

impl ToolError {
    pub fn validation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn handler(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Top-level error type for the concierge-agent crate.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("duplicate sub-agent name: {0}")]
    DuplicateSubAgent(String),
    #[error("agent '{0}' would appear among its own descendants")]
    AgentCycle(String),
    #[error("unknown sub-agent '{requested}' requested by '{agent}'")]
    UnknownSubAgent { agent: String, requested: String },
    #[error("agent '{agent}' exceeded the step limit of {limit}")]
    StepLimitExceeded { agent: String, limit: usize },
    #[error("run cancelled")]
    Cancelled,
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Llm(#[from] concierge_llm::SDKError),
    #[error(transparent)]
    Session(#[from] concierge_sessions::SessionStoreError),
}
