//! Completion orchestration: one request, optionally one tool round.
//!
//! `Init → AwaitingCompletion → (Done | AwaitingToolResults →
//! AwaitingFollowupCompletion → Done)`. The tool round itself lives in
//! `tools::tool_loop`; this type assembles the messages and owns the
//! empty-answer fallback.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use teller_core::config::CompletionConfig;
use teller_core::TellerError;

use crate::provider::{ChatMessage, ChatRequest, LlmProvider};
use crate::tools::tool_loop::{run_tool_round, ToolRun};
use crate::tools::{to_definitions, Tool};

/// Final answer of one orchestration, with the tool calls made on the way.
#[derive(Debug, Clone)]
pub struct Completion {
    pub answer: String,
    pub tool_runs: Vec<ToolRun>,
}

pub struct CompletionOrchestrator {
    provider: Arc<dyn LlmProvider>,
    tools: Vec<Box<dyn Tool>>,
    persona: String,
    fallback: String,
    temperature: f64,
    top_p: f64,
}

impl CompletionOrchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Vec<Box<dyn Tool>>,
        persona: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        let sampling = CompletionConfig::default();
        Self {
            provider,
            tools,
            persona: persona.into(),
            fallback: fallback.into(),
            temperature: sampling.temperature,
            top_p: sampling.top_p,
        }
    }

    pub fn with_sampling(mut self, completion: &CompletionConfig) -> Self {
        self.temperature = completion.temperature;
        self.top_p = completion.top_p;
        self
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Answer `user_prompt`. `system_prompt` defaults to the persona; with
    /// `enable_tools` the knowledge tool is declared and at most one tool
    /// round is run. Never returns an empty string.
    pub async fn generate(
        &self,
        user_prompt: &str,
        system_prompt: Option<&str>,
        enable_tools: bool,
    ) -> Result<String, TellerError> {
        self.generate_with_results(user_prompt, system_prompt, None, enable_tools)
            .await
    }

    /// `generate` with search results from an earlier round injected ahead
    /// of the model's turn.
    pub async fn generate_with_results(
        &self,
        user_prompt: &str,
        system_prompt: Option<&str>,
        tool_results: Option<&Value>,
        enable_tools: bool,
    ) -> Result<String, TellerError> {
        self.complete(user_prompt, system_prompt, tool_results, enable_tools)
            .await
            .map(|c| c.answer)
    }

    /// Like `generate_with_results`, but also reports the tool calls the
    /// model made so callers can check what the answer was based on.
    pub async fn complete(
        &self,
        user_prompt: &str,
        system_prompt: Option<&str>,
        tool_results: Option<&Value>,
        enable_tools: bool,
    ) -> Result<Completion, TellerError> {
        let mut messages = vec![
            ChatMessage::system(system_prompt.unwrap_or(&self.persona)),
            ChatMessage::user(user_prompt),
        ];
        if let Some(results) = tool_results {
            messages.push(ChatMessage::assistant(format!(
                "Knowledge base search results: {results}"
            )));
            messages.push(ChatMessage::user(
                "Please use the above information to answer my question.",
            ));
        }

        let request = ChatRequest {
            messages,
            tools: if enable_tools {
                to_definitions(&self.tools)
            } else {
                Vec::new()
            },
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let (response, tool_runs) = run_tool_round(self.provider.as_ref(), request, &self.tools)
            .await
            .map_err(|e| {
                warn!(provider = self.provider.name(), error = %e, "completion failed");
                e.into_teller(self.provider.name())
            })?;

        debug!(
            model = %response.model,
            tokens_in = response.tokens_in,
            tokens_out = response.tokens_out,
            tools = tool_runs.len(),
            "completion done"
        );

        let answer = match response.content.trim() {
            "" => self.fallback.clone(),
            text => text.to_string(),
        };
        Ok(Completion { answer, tool_runs })
    }
}
