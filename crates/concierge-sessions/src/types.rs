use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

pub type SessionId = String;
pub type Timestamp = String;

pub const USER_AUTHOR: &str = "user";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: SessionId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Agent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnPart {
    Text {
        text: String,
    },
    ToolCall {
        call_id: String,
        name: String,
        arguments: Value,
    },
    ToolResult {
        call_id: String,
        name: String,
        content: Value,
        is_error: bool,
    },
    Transfer {
        agent: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub author: String,
    pub parts: Vec<TurnPart>,
    pub timestamp: Timestamp,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            author: USER_AUTHOR.to_string(),
            parts: vec![TurnPart::Text { text: text.into() }],
            timestamp: current_timestamp(),
        }
    }

    pub fn agent(author: impl Into<String>, parts: Vec<TurnPart>) -> Self {
        Self {
            role: TurnRole::Agent,
            author: author.into(),
            parts,
            timestamp: current_timestamp(),
        }
    }

    pub fn agent_text(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self::agent(author, vec![TurnPart::Text { text: text.into() }])
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                TurnPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

pub fn current_timestamp() -> Timestamp {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs().to_string()
}
