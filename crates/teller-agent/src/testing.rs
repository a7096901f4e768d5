//! Provider fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError, ToolCall};

/// Replays queued responses in order and records every request it sees.
pub(crate) struct ScriptedProvider {
    responses: Mutex<VecDeque<ChatResponse>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn request(&self, index: usize) -> ChatRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

pub(crate) fn text(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_string(),
        stop_reason: "stop".to_string(),
        ..ChatResponse::default()
    }
}

pub(crate) fn tool_calls(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse {
        stop_reason: "tool_calls".to_string(),
        tool_calls: calls,
        ..ChatResponse::default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(req.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::Parse("script exhausted".into()))
    }
}

/// Always fails with an API error.
pub(crate) struct AlwaysFail;

#[async_trait]
impl LlmProvider for AlwaysFail {
    fn name(&self) -> &str {
        "always-fail"
    }

    async fn send(&self, _req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        Err(ProviderError::Api {
            status: 401,
            message: "invalid subscription key".into(),
        })
    }
}
