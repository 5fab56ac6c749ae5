mod function;
mod transfer;

pub use function::{function_tool, schema_for_arguments};
pub use transfer::{TRANSFER_TOOL, transfer_tool_definition};

use crate::ToolError;
use concierge_llm::{ToolCall, ToolDefinition};
use concierge_sessions::SessionKey;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type ToolFuture = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>;
pub type ToolExecutor = Arc<dyn Fn(Value, ToolContext) -> ToolFuture + Send + Sync>;

/// Where a tool call originated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolContext {
    pub session: SessionKey,
    pub agent: String,
    pub call_id: String,
}

#[derive(Clone)]
pub struct RegisteredTool {
    pub definition: ToolDefinition,
    pub executor: ToolExecutor,
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: RegisteredTool) -> Result<(), ToolError> {
        let name = tool.definition.name.clone();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateToolName(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| tool.definition.clone())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Validates the call's arguments against the tool schema and runs the
    /// handler. The handler never sees arguments that failed validation.
    pub async fn invoke(&self, call: &ToolCall, context: ToolContext) -> Result<Value, ToolError> {
        let registered = self
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        let arguments = parse_tool_arguments(call)?;
        validate_tool_arguments(&registered.definition.parameters, &arguments)
            .map_err(|message| ToolError::validation(&call.name, message))?;

        (registered.executor)(arguments, context).await
    }
}

/// Arguments as a JSON value, preferring the raw string the model sent.
pub fn parse_tool_arguments(call: &ToolCall) -> Result<Value, ToolError> {
    if let Some(raw_arguments) = &call.raw_arguments {
        return serde_json::from_str::<Value>(raw_arguments).map_err(|error| {
            ToolError::validation(&call.name, format!("invalid JSON arguments: {error}"))
        });
    }
    Ok(call.arguments.clone())
}

pub(crate) fn validate_tool_arguments(schema: &Value, arguments: &Value) -> Result<(), String> {
    let object = arguments
        .as_object()
        .ok_or_else(|| "tool arguments must be a JSON object".to_string())?;

    let schema_object = schema
        .as_object()
        .ok_or_else(|| "tool schema root must be a JSON object".to_string())?;

    if schema_object
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|schema_type| schema_type != "object")
    {
        return Err("tool schema root type must be 'object'".to_string());
    }

    if let Some(required) = schema_object.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(key) {
                return Err(format!("missing required argument '{key}'"));
            }
        }
    }

    let properties = schema_object
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let additional_allowed = schema_object
        .get("additionalProperties")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    for (key, value) in object {
        let Some(property) = properties.get(key) else {
            if additional_allowed {
                continue;
            }
            return Err(format!("unexpected argument '{key}' not allowed by schema"));
        };

        if let Some(type_name) = property.get("type").and_then(Value::as_str) {
            if !matches_json_type(type_name, value) {
                return Err(format!(
                    "argument '{key}' expected type '{type_name}' but received '{}'",
                    json_type_name(value)
                ));
            }
        }

        if let Some(allowed) = property.get("enum").and_then(Value::as_array) {
            if !allowed.contains(value) {
                return Err(format!("argument '{key}' is not one of the allowed values"));
            }
        }
    }

    Ok(())
}

fn matches_json_type(type_name: &str, value: &Value) -> bool {
    match type_name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.as_i64().is_some() || value.as_u64().is_some(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    if value.is_null() {
        "null"
    } else if value.is_boolean() {
        "boolean"
    } else if value.is_string() {
        "string"
    } else if value.is_number() {
        "number"
    } else if value.is_array() {
        "array"
    } else {
        "object"
    }
}
