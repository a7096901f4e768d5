//! Persona loading and the grounded-answer prompt templates.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::tools::knowledge::TOOL_NAME;

#[derive(Deserialize)]
struct VoiceConfig {
    system_prompt: Option<SystemPromptSection>,
}

#[derive(Deserialize)]
struct SystemPromptSection {
    content: Option<String>,
}

/// Persona from the voice configuration file (`system_prompt.content`), or
/// `default` when the file is missing, unreadable, or has no usable content.
pub fn load_persona(path: &Path, default: &str) -> String {
    match read_persona(path) {
        Some(persona) => {
            info!(path = %path.display(), chars = persona.len(), "loaded persona");
            persona
        }
        None => default.to_string(),
    }
}

fn read_persona(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to read voice config, using default persona"
            );
        })
        .ok()?;

    let config: VoiceConfig = serde_json::from_str(&raw)
        .map_err(|e| {
            warn!(path = %path.display(), error = %e, "invalid voice config, using default persona");
        })
        .ok()?;

    config
        .system_prompt
        .and_then(|s| s.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// System prompt restricting the model to the supplied context.
pub fn grounded_system_prompt(persona: &str, refusal: &str) -> String {
    format!(
        "{persona}\n\nUse ONLY the context provided. \
         If the answer is not in the context, reply with: {refusal}"
    )
}

/// System prompt for tool-calling mode: answers may only come from what
/// the knowledge search tool returns.
pub fn tool_system_prompt(persona: &str, refusal: &str) -> String {
    format!(
        "{persona}\n\nAlways call {TOOL_NAME} before answering and use ONLY its results. \
         If it returns nothing relevant, reply with: {refusal}"
    )
}

/// User turn carrying the question and its retrieved context.
pub fn grounded_user_prompt(question: &str, context: &str) -> String {
    format!("Question: {question}\n\nContext:\n{context}")
}
