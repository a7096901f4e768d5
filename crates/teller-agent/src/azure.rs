use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use teller_core::config::{AzureConfig, CompletionConfig};

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError, ToolCall};

/// Azure OpenAI chat-completions deployment, authenticated with `api-key`.
pub struct AzureOpenAiProvider {
    client: reqwest::Client,
    azure: AzureConfig,
    completion: CompletionConfig,
}

impl AzureOpenAiProvider {
    pub fn new(azure: AzureConfig, completion: CompletionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            azure,
            completion,
        }
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        "Azure GPT"
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let deployment = self.completion.deployment()?;
        let url = format!(
            "{}/openai/deployments/{}/chat/completions",
            self.azure.endpoint()?,
            deployment
        );
        let body = build_request_body(req);

        debug!(
            deployment = %deployment,
            messages = req.messages.len(),
            tools = req.tools.len(),
            "sending request to Azure OpenAI"
        );

        let resp = self
            .client
            .post(&url)
            .query(&[("api-version", self.azure.api_version.as_str())])
            .header("api-key", self.azure.api_key()?)
            .timeout(Duration::from_secs(self.completion.timeout_secs))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "Azure OpenAI API error");
            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let api_resp: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(parse_response(api_resp))
    }
}

fn build_request_body(req: &ChatRequest) -> serde_json::Value {
    let mut body = serde_json::json!({
        "messages": req.messages,
        "temperature": req.temperature,
        "top_p": req.top_p,
    });

    if !req.tools.is_empty() {
        let tools: Vec<serde_json::Value> = req
            .tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();
        body["tools"] = serde_json::Value::Array(tools);
    }

    body
}

fn parse_response(resp: ApiResponse) -> ChatResponse {
    let choice = resp.choices.unwrap_or_default().into_iter().next();
    let (message, stop_reason) = match choice {
        Some(c) => (c.message, c.finish_reason.unwrap_or_default()),
        None => (None, String::new()),
    };
    let (content, tool_calls) = match message {
        Some(m) => (
            m.content.unwrap_or_default(),
            m.tool_calls.unwrap_or_default(),
        ),
        None => (String::new(), Vec::new()),
    };

    ChatResponse {
        content,
        model: resp.model.unwrap_or_default(),
        tokens_in: resp.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
        tokens_out: resp
            .usage
            .as_ref()
            .map(|u| u.completion_tokens)
            .unwrap_or(0),
        stop_reason,
        tool_calls,
    }
}

// -- wire types --

#[derive(Deserialize)]
struct ApiResponse {
    choices: Option<Vec<Choice>>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ApiMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatMessage, ToolDefinition};
    use serde_json::json;
    use teller_core::TellerError;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> AzureOpenAiProvider {
        AzureOpenAiProvider::new(
            AzureConfig {
                endpoint: Some(server.uri()),
                api_key: Some("az-key".into()),
                ..AzureConfig::default()
            },
            CompletionConfig {
                deployment: Some("gpt-4o".into()),
                ..CompletionConfig::default()
            },
        )
    }

    fn request(tools: Vec<ToolDefinition>) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hello")],
            tools,
            temperature: 0.3,
            top_p: 0.95,
        }
    }

    #[tokio::test]
    async fn sends_messages_and_sampling_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(query_param("api-version", "2024-12-01-preview"))
            .and(header("api-key", "az-key"))
            .and(body_json(json!({
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "hello" }
                ],
                "temperature": 0.3,
                "top_p": 0.95
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4o-2024-08-06",
                "choices": [{
                    "finish_reason": "stop",
                    "message": { "role": "assistant", "content": "Walaikum salam" }
                }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 3 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = provider_for(&server).send(&request(Vec::new())).await.unwrap();
        assert_eq!(resp.content, "Walaikum salam");
        assert_eq!(resp.stop_reason, "stop");
        assert_eq!(resp.tokens_in, 12);
        assert!(resp.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn parses_tool_calls_with_null_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "finish_reason": "tool_calls",
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_9",
                            "type": "function",
                            "function": { "name": "search_knowledge_base", "arguments": "{\"query\":\"zakat\"}" }
                        }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let tools = vec![ToolDefinition {
            name: "search_knowledge_base".into(),
            description: "d".into(),
            parameters: json!({ "type": "object" }),
        }];
        let resp = provider_for(&server).send(&request(tools)).await.unwrap();
        assert_eq!(resp.content, "");
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].id, "call_9");
    }

    #[tokio::test]
    async fn tools_are_declared_as_functions() {
        let req = request(vec![ToolDefinition {
            name: "search_knowledge_base".into(),
            description: "Search".into(),
            parameters: json!({ "type": "object", "required": ["query"] }),
        }]);
        let body = build_request_body(&req);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "search_knowledge_base");
        assert_eq!(body["tools"][0]["function"]["parameters"]["required"][0], "query");

        let bare = build_request_body(&request(Vec::new()));
        assert!(bare.get("tools").is_none());
    }

    #[tokio::test]
    async fn non_2xx_is_api_error_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = provider_for(&server).send(&request(Vec::new())).await.unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_deployment_is_config_error() {
        let provider = AzureOpenAiProvider::new(AzureConfig::default(), CompletionConfig::default());
        let err = provider.send(&request(Vec::new())).await.unwrap_err();
        let err: TellerError = err.into_teller(provider.name());
        assert!(err.to_string().contains("AZURE_GPT_DEPLOYMENT"));
    }
}
