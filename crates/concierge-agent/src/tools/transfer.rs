use concierge_llm::ToolDefinition;
use serde_json::json;

/// Reserved tool through which a model hands the conversation to a sub-agent.
pub const TRANSFER_TOOL: &str = "transfer_to_agent";

pub fn transfer_tool_definition(agent_names: &[String]) -> ToolDefinition {
    ToolDefinition {
        name: TRANSFER_TOOL.to_string(),
        description: "Transfer the conversation to the agent best suited to answer the user. \
                      Call it at most once per reply."
            .to_string(),
        parameters: json!({
            "type": "object",
            "required": ["agent_name"],
            "properties": {
                "agent_name": {
                    "type": "string",
                    "enum": agent_names,
                    "description": "Name of the agent that should take over."
                }
            },
            "additionalProperties": false
        }),
    }
}
