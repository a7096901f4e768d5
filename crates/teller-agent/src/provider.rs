use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use teller_core::TellerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single chat-completions message.
///
/// Assistant messages may carry `tool_calls` instead of content; tool
/// messages answer one call each through `tool_call_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Echo of an assistant turn that requested tool calls.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Tool definition sent to the LLM API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// A tool call extracted from the LLM response, kept in wire shape so it can
/// be echoed back unchanged in the follow-up request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments object, exactly as the model produced it.
    #[serde(default)]
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Tools to expose to the LLM. Empty means no `tools` field is sent.
    pub tools: Vec<ToolDefinition>,
    pub temperature: f64,
    pub top_p: f64,
}

/// Response from an LLM provider (first choice only).
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub stop_reason: String,
    /// Tool calls requested by the LLM. Empty when no tools are called.
    pub tool_calls: Vec<ToolCall>,
}

/// Common interface for chat-completion providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Send a non-streaming chat request, wait for full response.
    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Config(#[from] TellerError),
}

impl ProviderError {
    /// Map into the service-level taxonomy, labelled with the provider name.
    /// API errors keep the provider's raw error text.
    pub fn into_teller(self, service: &str) -> TellerError {
        match self {
            ProviderError::Config(inner) => inner,
            ProviderError::Api { message, .. } => TellerError::upstream(service, message),
            other => TellerError::upstream(service, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_call_keeps_wire_shape() {
        let raw = json!({
            "id": "call_1",
            "type": "function",
            "function": { "name": "search_knowledge_base", "arguments": "{\"query\":\"car loan\"}" }
        });
        let call: ToolCall = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(call.function.name, "search_knowledge_base");
        assert_eq!(serde_json::to_value(&call).unwrap(), raw);
    }

    #[test]
    fn messages_omit_empty_fields() {
        let msg = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(msg, json!({ "role": "user", "content": "hi" }));

        let echo = ChatMessage::assistant_tool_calls(vec![ToolCall::function("c1", "t", "{}")]);
        let echo = serde_json::to_value(echo).unwrap();
        assert!(echo.get("content").is_none());
        assert_eq!(echo["tool_calls"][0]["id"], "c1");

        let tool = serde_json::to_value(ChatMessage::tool("c1", "{}")).unwrap();
        assert_eq!(tool, json!({ "role": "tool", "content": "{}", "tool_call_id": "c1" }));
    }

    #[test]
    fn api_error_maps_to_upstream_with_raw_text() {
        let err = ProviderError::Api {
            status: 401,
            message: "Access denied due to invalid subscription key".to_string(),
        }
        .into_teller("Azure GPT");
        assert_eq!(
            err.to_string(),
            "Azure GPT error: Access denied due to invalid subscription key"
        );
    }
}
