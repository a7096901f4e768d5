//! Tools the completion provider may call.
//!
//! Defines the `Tool` trait, the JSON-payload `ToolResult`, and conversion to
//! the provider-level `ToolDefinition`.

pub mod knowledge;
pub mod tool_loop;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::provider::ToolDefinition;

/// Result of executing a tool. `content` is always a JSON document, so the
/// model sees the same shape for successes and failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(payload: &Value) -> Self {
        Self {
            content: payload.to_string(),
            is_error: false,
        }
    }

    /// `{"error": message}` payload.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: json!({ "error": message.into() }).to_string(),
            is_error: true,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by.
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON Schema for the arguments object.
    fn input_schema(&self) -> Value;
    async fn execute(&self, input: Value) -> ToolResult;
}

/// Convert a slice of tools to API-level tool definitions.
pub fn to_definitions(tools: &[Box<dyn Tool>]) -> Vec<ToolDefinition> {
    tools
        .iter()
        .map(|t| ToolDefinition {
            name: t.name().to_string(),
            description: t.description().to_string(),
            parameters: t.input_schema(),
        })
        .collect()
}
