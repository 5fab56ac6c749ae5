use crate::tools::{TRANSFER_TOOL, parse_tool_arguments};
use crate::ToolError;
use concierge_llm::{Response, ToolCall};
use serde_json::Value;

/// What an agent does with one model response.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Respond(String),
    CallTools { text: String, calls: Vec<ToolCall> },
    Delegate { text: String, agent: String },
    Ambiguous { text: String, candidates: Vec<String> },
    /// Every transfer call was malformed; each is answered with its error.
    RejectedTransfers {
        text: String,
        rejected: Vec<(ToolCall, String)>,
    },
}

/// Where an agent is in its loop; reported in logs only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    AwaitingModelDecision,
    ToolCall,
    Delegated,
    TextResponse,
}

impl Decision {
    /// Classifies a response. Transfer calls are only recognised when the
    /// agent has children; otherwise they are ordinary (unknown) tool calls.
    /// Malformed transfers are ignored when a well-formed one names a target.
    pub fn from_response(response: &Response, can_delegate: bool) -> Self {
        let text = response.text();
        let calls = response.tool_calls();
        if calls.is_empty() {
            return Self::Respond(text);
        }

        let (transfers, others): (Vec<ToolCall>, Vec<ToolCall>) = calls
            .into_iter()
            .partition(|call| can_delegate && call.name == TRANSFER_TOOL);
        if transfers.is_empty() {
            return Self::CallTools {
                text,
                calls: others,
            };
        }

        if !others.is_empty() {
            tracing::warn!(
                dropped = ?others.iter().map(|call| call.name.as_str()).collect::<Vec<_>>(),
                "transfer requested alongside tool calls; dropping the tool calls"
            );
        }

        let mut candidates: Vec<String> = Vec::new();
        let mut rejected = Vec::new();
        for call in transfers {
            match transfer_target(&call) {
                Ok(target) => {
                    if !candidates.contains(&target) {
                        candidates.push(target);
                    }
                }
                Err(message) => rejected.push((call, message)),
            }
        }

        match candidates.len() {
            0 => Self::RejectedTransfers { text, rejected },
            1 => Self::Delegate {
                text,
                agent: candidates.remove(0),
            },
            _ => Self::Ambiguous { text, candidates },
        }
    }

    pub fn next_state(&self) -> AgentState {
        match self {
            Self::Respond(_) | Self::Ambiguous { .. } => AgentState::TextResponse,
            Self::CallTools { .. } | Self::RejectedTransfers { .. } => AgentState::ToolCall,
            Self::Delegate { .. } => AgentState::Delegated,
        }
    }
}

fn transfer_target(call: &ToolCall) -> Result<String, String> {
    let arguments = parse_tool_arguments(call).map_err(|error| match error {
        ToolError::SchemaValidation { message, .. } => message,
        other => other.to_string(),
    })?;
    match arguments.get("agent_name") {
        None => Err("missing required argument 'agent_name'".to_string()),
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        Some(_) => Err("argument 'agent_name' must be a non-empty string".to_string()),
    }
}
