use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use teller_core::config::AssistantConfig;
use teller_core::TellerError;

use crate::orchestrator::CompletionOrchestrator;
use crate::prompt::{grounded_system_prompt, grounded_user_prompt, tool_system_prompt};
use crate::retriever::KnowledgeRetriever;
use crate::tools::knowledge::TOOL_NAME;
use crate::tools::tool_loop::ToolRun;

/// Turns one user utterance into one reply. Never fails: every failure path
/// ends in one of the configured canned sentences.
pub struct Assistant {
    orchestrator: CompletionOrchestrator,
    retriever: Arc<KnowledgeRetriever>,
    settings: AssistantConfig,
}

/// `query` and `greetings` must already be trimmed and lower-cased.
pub fn is_greeting(query: &str, greetings: &[String]) -> bool {
    greetings.iter().any(|g| g == query)
}

impl Assistant {
    pub fn new(
        orchestrator: CompletionOrchestrator,
        retriever: Arc<KnowledgeRetriever>,
        mut settings: AssistantConfig,
    ) -> Self {
        settings.greetings = settings
            .greetings
            .iter()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .collect();
        Self {
            orchestrator,
            retriever,
            settings,
        }
    }

    pub fn settings(&self) -> &AssistantConfig {
        &self.settings
    }

    /// Reply to `text`.
    ///
    /// 1. Blank input (including an empty transcript) gets the empty-input prompt.
    /// 2. Greetings are answered without retrieval or completion.
    /// 3. In tool-calling mode the model decides what to search for, but an
    ///    answer not backed by a successful search is replaced by the refusal.
    /// 4. Otherwise context is retrieved first; no context means the refusal.
    ///
    /// Either way the model's general knowledge never reaches the user.
    pub async fn process_query(&self, text: &str) -> String {
        let query = text.trim();
        if query.is_empty() {
            return self.settings.empty_input.clone();
        }

        if is_greeting(&query.to_lowercase(), &self.settings.greetings) {
            debug!("greeting short-circuit");
            return self.settings.greeting_reply.clone();
        }

        let answer = if self.settings.tool_calling {
            match self.answer_with_tools(query).await {
                Ok(Some(answer)) => Ok(answer),
                Ok(None) => {
                    info!("no knowledge base results behind the answer, refusing");
                    return self.settings.refusal.clone();
                }
                Err(e) => Err(e),
            }
        } else {
            let context = self.retriever.build_context(query).await;
            if context.is_empty() {
                info!("no knowledge context, refusing");
                return self.settings.refusal.clone();
            }

            let system = grounded_system_prompt(self.orchestrator.persona(), &self.settings.refusal);
            let user = grounded_user_prompt(query, &context);
            self.orchestrator.generate(&user, Some(&system), false).await
        };

        answer.unwrap_or_else(|e| {
            warn!(error = %e, "query processing failed");
            self.settings.apology.clone()
        })
    }

    /// `None` when the model answered without a knowledge search that
    /// returned results.
    async fn answer_with_tools(&self, query: &str) -> Result<Option<String>, TellerError> {
        let system = tool_system_prompt(self.orchestrator.persona(), &self.settings.refusal);
        let done = self.orchestrator.complete(query, Some(&system), None, true).await?;
        Ok(done
            .tool_runs
            .iter()
            .any(found_knowledge)
            .then_some(done.answer))
    }
}

fn found_knowledge(run: &ToolRun) -> bool {
    run.name == TOOL_NAME
        && !run.result.is_error
        && serde_json::from_str::<Value>(&run.result.content)
            .is_ok_and(|payload| payload["status"] == "success")
}
