//! `search_knowledge_base`, the single tool exposed to the model.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::retriever::KnowledgeRetriever;

use super::{Tool, ToolResult};

pub const TOOL_NAME: &str = "search_knowledge_base";

pub struct KnowledgeSearchTool {
    retriever: Arc<KnowledgeRetriever>,
}

impl KnowledgeSearchTool {
    pub fn new(retriever: Arc<KnowledgeRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the Bank Islami knowledge base for information about products, eligibility, documents, and processes"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find relevant information"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let query = match input.get("query").and_then(Value::as_str) {
            Some(q) if !q.trim().is_empty() => q,
            _ => return ToolResult::error("missing required parameter: query"),
        };
        ToolResult::success(&self.retriever.search_tool(query).await)
    }
}
