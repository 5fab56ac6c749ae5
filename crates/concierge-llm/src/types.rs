use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Add;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallData {
    pub id: String,
    pub name: String,
    pub arguments: Value,
    #[serde(default = "default_tool_call_type")]
    pub r#type: String,
}

fn default_tool_call_type() -> String {
    "function".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResultData {
    pub tool_call_id: String,
    pub content: Value,
    pub is_error: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ToolCall(ToolCallData),
    ToolResult(ToolResultData),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_call(data: ToolCallData) -> Self {
        Self::ToolCall(data)
    }

    pub fn tool_result(data: ToolResultData) -> Self {
        Self::ToolResult(data)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
    pub name: Option<String>,
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::with_text(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::with_text(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_text(Role::Assistant, text)
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: Value, is_error: bool) -> Self {
        let tool_call_id = tool_call_id.into();
        Self {
            role: Role::Tool,
            content: vec![ContentPart::tool_result(ToolResultData {
                tool_call_id: tool_call_id.clone(),
                content,
                is_error,
            })],
            name: None,
            tool_call_id: Some(tool_call_id),
        }
    }

    fn with_text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentPart::text(text)],
            name: None,
            tool_call_id: None,
        }
    }

    /// Concatenated text parts, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Normalized tool call extracted from a response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
    pub raw_arguments: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: Value,
    pub is_error: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoice {
    pub mode: String,
    pub tool_name: Option<String>,
}

impl ToolChoice {
    pub fn auto() -> Self {
        Self {
            mode: "auto".to_string(),
            tool_name: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub model: String,
    pub messages: Vec<Message>,
    pub provider: Option<String>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub tool_choice: Option<ToolChoice>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u64>,
    pub metadata: Option<HashMap<String, String>>,
}

impl Request {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            provider: None,
            tools: None,
            tool_choice: None,
            temperature: None,
            max_tokens: None,
            metadata: None,
        }
    }

    /// Text of the system message, if the request carries one.
    pub fn system_prompt(&self) -> Option<String> {
        self.messages
            .iter()
            .find(|message| message.role == Role::System)
            .map(Message::text)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools
            .iter()
            .flatten()
            .map(|tool| tool.name.as_str())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinishReason {
    pub reason: String,
    pub raw: Option<String>,
}

impl FinishReason {
    pub fn stop() -> Self {
        Self {
            reason: "stop".to_string(),
            raw: None,
        }
    }

    pub fn tool_calls() -> Self {
        Self {
            reason: "tool_calls".to_string(),
            raw: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Self) -> Self::Output {
        Usage {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub model: String,
    pub provider: String,
    pub message: Message,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl Response {
    pub fn text(&self) -> String {
        self.message.text()
    }

    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.message
            .content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolCall(data) => Some(match &data.arguments {
                    Value::String(raw) => ToolCall {
                        id: data.id.clone(),
                        name: data.name.clone(),
                        arguments: serde_json::from_str(raw).unwrap_or(Value::Null),
                        raw_arguments: Some(raw.clone()),
                    },
                    arguments => ToolCall {
                        id: data.id.clone(),
                        name: data.name.clone(),
                        arguments: arguments.clone(),
                        raw_arguments: None,
                    },
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_tool_calls_keep_raw_string_arguments() {
        let response = Response {
            id: "r1".to_string(),
            model: "m".to_string(),
            provider: "p".to_string(),
            message: Message {
                role: Role::Assistant,
                content: vec![
                    ContentPart::text("checking"),
                    ContentPart::tool_call(ToolCallData {
                        id: "call-1".to_string(),
                        name: "bookHotel".to_string(),
                        arguments: Value::String(r#"{"location":"Paris"}"#.to_string()),
                        r#type: "function".to_string(),
                    }),
                ],
                name: None,
                tool_call_id: None,
            },
            finish_reason: FinishReason::tool_calls(),
            usage: Usage::default(),
        };

        let calls = response.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments, json!({"location": "Paris"}));
        assert_eq!(
            calls[0].raw_arguments.as_deref(),
            Some(r#"{"location":"Paris"}"#)
        );
        assert_eq!(response.text(), "checking");
    }

    #[test]
    fn content_part_serializes_with_kind_tag() {
        let encoded = serde_json::to_value(ContentPart::text("hi")).expect("serialize");
        assert_eq!(encoded, json!({"kind": "text", "text": "hi"}));
    }

    #[test]
    fn usage_addition_sums_every_counter() {
        let total = Usage {
            input_tokens: 1,
            output_tokens: 2,
            total_tokens: 3,
        } + Usage {
            input_tokens: 10,
            output_tokens: 20,
            total_tokens: 30,
        };
        assert_eq!(total.total_tokens, 33);
        assert_eq!(total.input_tokens, 11);
    }
}
