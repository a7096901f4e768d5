//! Single-round tool execution.
//!
//! Flow: request → if tool calls → execute all → inject one tool message per
//! call → one follow-up request without tools → done. Depth is capped at one
//! round; tool calls in the follow-up response are ignored.

use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::provider::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, ProviderError, ToolCall};

use super::{Tool, ToolResult};

/// One executed tool call and what it returned to the model.
#[derive(Debug, Clone)]
pub struct ToolRun {
    pub name: String,
    pub result: ToolResult,
}

/// Run the request and, if the model asked for tools, one follow-up round.
///
/// Returns the final response together with the tool calls executed, in the
/// order the model issued them.
pub async fn run_tool_round(
    provider: &dyn LlmProvider,
    request: ChatRequest,
    tools: &[Box<dyn Tool>],
) -> Result<(ChatResponse, Vec<ToolRun>), ProviderError> {
    let response = provider.send(&request).await?;
    if response.tool_calls.is_empty() {
        return Ok((response, Vec::new()));
    }

    debug!(calls = response.tool_calls.len(), "executing tool calls");

    let results = join_all(response.tool_calls.iter().map(|call| execute_tool(tools, call))).await;

    let mut followup = request;
    followup
        .messages
        .push(ChatMessage::assistant_tool_calls(response.tool_calls.clone()));
    let mut runs = Vec::with_capacity(results.len());
    for (call, result) in response.tool_calls.iter().zip(results) {
        followup
            .messages
            .push(ChatMessage::tool(call.id.clone(), result.content.clone()));
        runs.push(ToolRun {
            name: call.function.name.clone(),
            result,
        });
    }
    followup.tools.clear();

    let last = provider.send(&followup).await?;
    if !last.tool_calls.is_empty() {
        warn!(
            calls = last.tool_calls.len(),
            "follow-up response requested more tools, ignoring"
        );
    }
    info!(
        tools = ?runs.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        failed = runs.iter().filter(|r| r.result.is_error).count(),
        "tool round complete"
    );
    Ok((last, runs))
}

/// Find and execute the named function tool. Unknown tools, non-function
/// calls and unparseable arguments produce an error payload.
async fn execute_tool(tools: &[Box<dyn Tool>], call: &ToolCall) -> ToolResult {
    if call.kind != "function" {
        return ToolResult::error(format!("unsupported tool call type: {}", call.kind));
    }
    let Some(tool) = tools.iter().find(|t| t.name() == call.function.name) else {
        return ToolResult::error(format!("unknown tool: {}", call.function.name));
    };

    let input: Value = match serde_json::from_str(&call.function.arguments) {
        Ok(v) => v,
        Err(e) => {
            warn!(tool = %call.function.name, error = %e, "invalid tool arguments");
            return ToolResult::error(format!("invalid arguments: {e}"));
        }
    };

    debug!(tool = %call.function.name, "executing tool");
    tool.execute(input).await
}
