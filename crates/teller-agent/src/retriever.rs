//! Knowledge retrieval over Azure AI Search.
//!
//! `KnowledgeRetriever` never fails toward its caller: any backend error is
//! logged here and reduced to an empty result, which downstream code reads as
//! "no knowledge available".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use teller_core::config::SearchConfig;
use teller_core::types::{ContextItem, RetrievedContext};
use teller_core::TellerError;

/// Items fed into a grounded answer.
pub const CONTEXT_TOP_K: usize = 5;
/// Items returned to the model through the search tool.
pub const TOOL_TOP_K: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Config(#[from] TellerError),
}

/// A document search service. Ranking is whatever the service returns.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> Result<RetrievedContext, SearchError>;
}

/// Azure AI Search index queried through the REST `docs/search` endpoint.
pub struct AzureSearch {
    client: reqwest::Client,
    config: SearchConfig,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<Value>,
}

impl AzureSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl SearchBackend for AzureSearch {
    async fn search(&self, query: &str, top_k: usize) -> Result<RetrievedContext, SearchError> {
        let url = format!(
            "{}/indexes/{}/docs/search",
            self.config.endpoint()?,
            self.config.index()?
        );

        let resp = self
            .client
            .post(&url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", self.config.api_key()?)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&json!({ "search": query, "top": top_k, "count": true }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SearchError::Api { status, message });
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(body.value.iter().map(to_context_item).collect())
    }
}

/// Map one search document. Content falls back to `text`, then to the whole
/// document; source falls back to `title`, then `"Unknown"`.
fn to_context_item(doc: &Value) -> ContextItem {
    let field = |name: &str| {
        doc.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    ContextItem {
        content: field("content")
            .or_else(|| field("text"))
            .unwrap_or_else(|| doc.to_string()),
        score: doc
            .get("@search.score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        source: field("source")
            .or_else(|| field("title"))
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

pub struct KnowledgeRetriever {
    backend: Arc<dyn SearchBackend>,
}

impl KnowledgeRetriever {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Ranked snippets for `query`, or empty on any backend failure.
    pub async fn search(&self, query: &str, top_k: usize) -> RetrievedContext {
        match self.backend.search(query, top_k).await {
            Ok(items) => {
                debug!(hits = items.len(), "knowledge search complete");
                items
            }
            Err(e) => {
                warn!(error = %e, "knowledge search failed, continuing without context");
                Vec::new()
            }
        }
    }

    /// Prompt-ready context block. Empty when the query is blank (no search
    /// is made) or nothing was found.
    pub async fn build_context(&self, query: &str) -> String {
        if query.trim().is_empty() {
            return String::new();
        }
        format_context(&self.search(query, CONTEXT_TOP_K).await)
    }

    /// Tool-shaped result handed back to the model.
    pub async fn search_tool(&self, query: &str) -> Value {
        let items = self.search(query, TOOL_TOP_K).await;
        if items.is_empty() {
            return json!({
                "status": "no_results",
                "message": "No relevant information found in knowledge base",
            });
        }

        let results: Vec<Value> = items
            .into_iter()
            .map(|item| {
                json!({
                    "source": item.source,
                    "content": item.content,
                    "confidence": item.score,
                })
            })
            .collect();
        json!({ "status": "success", "results": results })
    }
}

pub fn format_context(items: &[ContextItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "Source: {} (Relevance: {:.2})\nContent: {}",
                item.source, item.score, item.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
