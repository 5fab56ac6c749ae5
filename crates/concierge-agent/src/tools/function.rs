use super::{RegisteredTool, ToolContext, ToolExecutor};
use crate::ToolError;
use concierge_llm::ToolDefinition;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

/// Builds a tool whose parameter schema is derived from `A` and whose result
/// is `R` serialized to JSON.
pub fn function_tool<A, R, E, H, Fut>(
    name: impl Into<String>,
    description: impl Into<String>,
    handler: H,
) -> Result<RegisteredTool, ToolError>
where
    A: DeserializeOwned + JsonSchema + Send + 'static,
    R: Serialize + Send + 'static,
    E: Display + Send + 'static,
    H: Fn(A, ToolContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let name = name.into();
    if name.trim().is_empty() {
        return Err(ToolError::InvalidSchema {
            tool: name,
            message: "tool name must not be empty".to_string(),
        });
    }
    let parameters = schema_for_arguments::<A>(&name)?;

    let handler = Arc::new(handler);
    let tool_name = name.clone();
    let executor: ToolExecutor = Arc::new(move |arguments: Value, context: ToolContext| {
        let handler = handler.clone();
        let tool_name = tool_name.clone();
        Box::pin(async move {
            let arguments: A = serde_json::from_value(arguments)
                .map_err(|error| ToolError::validation(&tool_name, error.to_string()))?;
            let output = handler(arguments, context)
                .await
                .map_err(|error| ToolError::handler(&tool_name, error.to_string()))?;
            serde_json::to_value(output)
                .map_err(|error| ToolError::handler(&tool_name, error.to_string()))
        })
    });

    Ok(RegisteredTool {
        definition: ToolDefinition {
            name,
            description: description.into(),
            parameters,
        },
        executor,
    })
}

/// JSON schema for an argument type, flattened to the object shape model
/// providers accept.
pub fn schema_for_arguments<A: JsonSchema>(tool: &str) -> Result<Value, ToolError> {
    let root = schemars::schema_for!(A);
    let mut schema = serde_json::to_value(root.schema).map_err(|error| ToolError::InvalidSchema {
        tool: tool.to_string(),
        message: error.to_string(),
    })?;

    let object = schema
        .as_object_mut()
        .ok_or_else(|| ToolError::InvalidSchema {
            tool: tool.to_string(),
            message: "schema must be a JSON object".to_string(),
        })?;
    object.remove("title");
    object.remove("$schema");

    if object.get("type").and_then(Value::as_str) != Some("object") {
        return Err(ToolError::InvalidSchema {
            tool: tool.to_string(),
            message: "argument type must serialize as a JSON object".to_string(),
        });
    }
    Ok(schema)
}
