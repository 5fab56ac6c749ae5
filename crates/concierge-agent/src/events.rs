use crate::AgentError;
use concierge_sessions::{Turn, TurnPart};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::pin::Pin;

/// Lazily produced, finite sequence of run events. An `Err` item ends it.
pub type RunEventStream = Pin<Box<dyn Stream<Item = Result<RunEvent, AgentError>> + Send>>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { value: Value },
    InvalidArguments { message: String },
    HandlerFailed { message: String },
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Success { .. })
    }

    /// Payload handed back to the model as the tool result.
    pub fn result_content(&self) -> Value {
        match self {
            Self::Success { value } => value.clone(),
            Self::InvalidArguments { message } | Self::HandlerFailed { message } => {
                json!({ "error": message })
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub author: String,
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Value,
    pub outcome: ToolOutcome,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Text {
        author: String,
        text: String,
    },
    ToolCall(ToolInvocation),
    Delegation {
        from: String,
        to: String,
    },
    Clarification {
        author: String,
        text: String,
        candidates: Vec<String>,
    },
}

impl RunEvent {
    pub fn author(&self) -> &str {
        match self {
            Self::Text { author, .. } | Self::Clarification { author, .. } => author,
            Self::ToolCall(invocation) => &invocation.author,
            Self::Delegation { from, .. } => from,
        }
    }

    /// Text shown to the user, if the event carries any.
    pub fn user_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } | Self::Clarification { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The history entry recorded for this event.
    pub fn to_turn(&self) -> Turn {
        match self {
            Self::Text { author, text } | Self::Clarification { author, text, .. } => {
                Turn::agent_text(author.clone(), text.clone())
            }
            Self::ToolCall(invocation) => Turn::agent(
                invocation.author.clone(),
                vec![
                    TurnPart::ToolCall {
                        call_id: invocation.call_id.clone(),
                        name: invocation.tool_name.clone(),
                        arguments: invocation.arguments.clone(),
                    },
                    TurnPart::ToolResult {
                        call_id: invocation.call_id.clone(),
                        name: invocation.tool_name.clone(),
                        content: invocation.outcome.result_content(),
                        is_error: invocation.outcome.is_error(),
                    },
                ],
            ),
            Self::Delegation { from, to } => {
                Turn::agent(from.clone(), vec![TurnPart::Transfer { agent: to.clone() }])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_sessions::TurnRole;

    #[test]
    fn tool_call_turn_carries_call_and_result() {
        let event = RunEvent::ToolCall(ToolInvocation {
            author: "Booker".to_string(),
            call_id: "c1".to_string(),
            tool_name: "bookHotel".to_string(),
            arguments: json!({"location": "London"}),
            outcome: ToolOutcome::HandlerFailed {
                message: "sold out".to_string(),
            },
        });

        let turn = event.to_turn();
        assert_eq!(turn.role, TurnRole::Agent);
        assert_eq!(turn.author, "Booker");
        assert_eq!(turn.parts.len(), 2);
        match &turn.parts[1] {
            TurnPart::ToolResult {
                content, is_error, ..
            } => {
                assert!(*is_error);
                assert_eq!(content["error"], "sold out");
            }
            other => panic!("unexpected part: {other:?}"),
        }
    }

    #[test]
    fn delegation_is_recorded_as_transfer_by_the_parent() {
        let event = RunEvent::Delegation {
            from: "Coordinator".to_string(),
            to: "Booker".to_string(),
        };
        assert_eq!(event.author(), "Coordinator");
        assert!(event.user_text().is_none());
        assert_eq!(
            event.to_turn().parts,
            vec![TurnPart::Transfer {
                agent: "Booker".to_string()
            }]
        );
    }

    #[test]
    fn clarification_exposes_text() {
        let event = RunEvent::Clarification {
            author: "Coordinator".to_string(),
            text: "Booker or Info?".to_string(),
            candidates: vec!["Booker".to_string(), "Info".to_string()],
        };
        assert_eq!(event.user_text(), Some("Booker or Info?"));
        assert_eq!(event.to_turn().text(), "Booker or Info?");
    }
}
