use crate::agent::Agent;
use crate::tools::TRANSFER_TOOL;
use concierge_llm::{ContentPart, Message, Role, ToolCallData};
use concierge_sessions::{Turn, TurnPart, TurnRole};

pub(crate) fn system_prompt(agent: &Agent) -> String {
    let mut prompt = format!("You are {}.", agent.name());
    if !agent.description().is_empty() {
        prompt.push(' ');
        prompt.push_str(agent.description());
    }
    if let Some(instruction) = agent.instruction() {
        prompt.push_str("\n\n");
        prompt.push_str(instruction);
    }

    if !agent.sub_agents().is_empty() {
        prompt.push_str(&format!(
            "\n\nYou can hand the conversation to one of these agents with the \
             `{TRANSFER_TOOL}` tool. Pick exactly one when it is better suited to \
             answer the user:\n"
        ));
        for child in agent.sub_agents() {
            prompt.push_str(&format!("- {}: {}\n", child.name(), child.description()));
        }
    }
    prompt
}

/// Renders stored turns as model messages, oldest first.
pub(crate) fn turns_to_messages(turns: &[Turn]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(turns.len());
    for turn in turns {
        match turn.role {
            TurnRole::User => messages.push(Message::user(turn.text())),
            TurnRole::Agent => push_agent_turn(turn, &mut messages),
        }
    }
    messages
}

fn push_agent_turn(turn: &Turn, messages: &mut Vec<Message>) {
    let mut pending: Vec<ContentPart> = Vec::new();
    for part in &turn.parts {
        match part {
            TurnPart::Text { text } => pending.push(ContentPart::text(text.clone())),
            TurnPart::Transfer { agent } => {
                pending.push(ContentPart::text(format!(
                    "Transferred the conversation to {agent}."
                )));
            }
            TurnPart::ToolCall {
                call_id,
                name,
                arguments,
            } => pending.push(ContentPart::tool_call(ToolCallData {
                id: call_id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
                r#type: "function".to_string(),
            })),
            TurnPart::ToolResult {
                call_id,
                content,
                is_error,
                ..
            } => {
                flush_assistant(&turn.author, &mut pending, messages);
                messages.push(Message::tool_result(
                    call_id.clone(),
                    content.clone(),
                    *is_error,
                ));
            }
        }
    }
    flush_assistant(&turn.author, &mut pending, messages);
}

fn flush_assistant(author: &str, pending: &mut Vec<ContentPart>, messages: &mut Vec<Message>) {
    if pending.is_empty() {
        return;
    }
    messages.push(Message {
        role: Role::Assistant,
        content: std::mem::take(pending),
        name: Some(author.to_string()),
        tool_call_id: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_turn_becomes_assistant_call_then_tool_result() {
        let turns = vec![
            Turn::user("book a hotel in London on 2025-11-14"),
            Turn::agent(
                "Booker",
                vec![
                    TurnPart::ToolCall {
                        call_id: "c1".to_string(),
                        name: "bookHotel".to_string(),
                        arguments: json!({"location": "London", "date": "2025-11-14"}),
                    },
                    TurnPart::ToolResult {
                        call_id: "c1".to_string(),
                        name: "bookHotel".to_string(),
                        content: json!({"status": "success"}),
                        is_error: false,
                    },
                ],
            ),
            Turn::agent_text("Booker", "Done."),
        ];

        let messages = turns_to_messages(&turns);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].name.as_deref(), Some("Booker"));
        assert!(matches!(messages[1].content[0], ContentPart::ToolCall(_)));
        assert_eq!(messages[2].role, Role::Tool);
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(messages[3].text(), "Done.");
    }

    #[test]
    fn transfer_is_rendered_as_assistant_note() {
        let turns = vec![Turn::agent(
            "Coordinator",
            vec![TurnPart::Transfer {
                agent: "Booker".to_string(),
            }],
        )];
        let messages = turns_to_messages(&turns);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].text(),
            "Transferred the conversation to Booker."
        );
    }
}
