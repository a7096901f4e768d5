//! Fakes and request helpers shared by the gateway integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::Value;
use tokio::sync::Notify;

use teller_agent::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};
use teller_agent::tools::knowledge::KnowledgeSearchTool;
use teller_agent::tools::Tool;
use teller_agent::{Assistant, CompletionOrchestrator, KnowledgeRetriever, SearchBackend, SearchError};
use teller_channels::{Channel, ChannelError, OutboundMessage};
use teller_core::config::WhatsAppConfig;
use teller_core::types::{ContextItem, MediaRef, RetrievedContext};
use teller_core::{MediaCache, TellerConfig};
use teller_gateway::AppState;
use teller_voice::{AudioFormat, SpeechAudio, SpeechError, SpeechGateway, TranscribeRequest};
use teller_whatsapp::WhatsAppChannel;

pub const MODEL_ANSWER: &str = "You need your CNIC and a recent photograph.";
pub const FAKE_AUDIO: &[u8] = b"ID3-fake-mp3";

#[derive(Default)]
pub struct FakeProvider {
    pub calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn send(&self, _req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChatResponse {
            content: MODEL_ANSWER.to_string(),
            stop_reason: "stop".to_string(),
            ..ChatResponse::default()
        })
    }
}

pub struct FakeSearch {
    pub items: RetrievedContext,
    pub calls: AtomicUsize,
}

#[async_trait]
impl SearchBackend for FakeSearch {
    async fn search(&self, _query: &str, top_k: usize) -> Result<RetrievedContext, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.iter().take(top_k).cloned().collect())
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    pub transcript: String,
    pub fail_transcribe: bool,
    pub fail_synthesize: bool,
    pub transcribe_calls: AtomicUsize,
    pub last_upload: Mutex<Option<TranscribeRequest>>,
}

#[async_trait]
impl SpeechGateway for FakeSpeech {
    async fn transcribe(&self, req: TranscribeRequest) -> Result<String, SpeechError> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_upload.lock().unwrap() = Some(req);
        if self.fail_transcribe {
            return Err(SpeechError::Api {
                service: "Azure STT",
                status: 400,
                message: "Invalid file format".into(),
            });
        }
        Ok(self.transcript.clone())
    }

    async fn synthesize(&self, _text: &str) -> Result<SpeechAudio, SpeechError> {
        if self.fail_synthesize {
            return Err(SpeechError::Api {
                service: "Azure TTS",
                status: 500,
                message: "synthesis unavailable".into(),
            });
        }
        Ok(SpeechAudio {
            bytes: FAKE_AUDIO.to_vec(),
            format: AudioFormat::new("mp3"),
        })
    }
}

#[derive(Default)]
pub struct FakeChannel {
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub downloads: Mutex<Vec<MediaRef>>,
    /// When set, `send` parks until the gate is notified.
    pub gate: Option<Arc<Notify>>,
}

impl FakeChannel {
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for FakeChannel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }

    async fn download_media(&self, media: &MediaRef) -> Result<Vec<u8>, ChannelError> {
        self.downloads.lock().unwrap().push(media.clone());
        Ok(b"OggS-voice-note".to_vec())
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub provider: Arc<FakeProvider>,
    pub search: Arc<FakeSearch>,
    pub speech: Arc<FakeSpeech>,
    pub channel: Arc<FakeChannel>,
}

impl Harness {
    pub fn router(&self) -> axum::Router {
        teller_gateway::build_router(Arc::clone(&self.state))
    }

    pub fn completions(&self) -> usize {
        self.provider.calls.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> usize {
        self.search.calls.load(Ordering::SeqCst)
    }

    pub fn transcriptions(&self) -> usize {
        self.speech.transcribe_calls.load(Ordering::SeqCst)
    }
}

pub fn test_config() -> TellerConfig {
    TellerConfig {
        whatsapp: WhatsAppConfig {
            access_token: Some("EAAG-test".into()),
            phone_number_id: Some("1065".into()),
            verify_token: Some("verify-me".into()),
            public_base_url: Some("https://bot.example.com/".into()),
            ..WhatsAppConfig::default()
        },
        ..TellerConfig::default()
    }
}

pub fn account_docs() -> RetrievedContext {
    vec![ContextItem {
        source: "accounts.pdf".into(),
        content: "Account opening requires CNIC and one photograph.".into(),
        score: 2.75,
    }]
}

pub fn harness_with(config: TellerConfig, items: RetrievedContext, speech: FakeSpeech) -> Harness {
    harness_with_channel(config, items, speech, FakeChannel::default())
}

pub fn harness_with_channel(
    config: TellerConfig,
    items: RetrievedContext,
    speech: FakeSpeech,
    channel: FakeChannel,
) -> Harness {
    let provider = Arc::new(FakeProvider::default());
    let search = Arc::new(FakeSearch {
        items,
        calls: AtomicUsize::new(0),
    });
    let speech = Arc::new(speech);
    let channel = Arc::new(channel);

    let retriever = Arc::new(KnowledgeRetriever::new(search.clone()));
    let tools: Vec<Box<dyn Tool>> = vec![Box::new(KnowledgeSearchTool::new(retriever.clone()))];
    let orchestrator = CompletionOrchestrator::new(
        provider.clone(),
        tools,
        config.assistant.persona.clone(),
        config.assistant.fallback.clone(),
    );
    let assistant = Assistant::new(orchestrator, retriever, config.assistant.clone());
    let whatsapp = Arc::new(WhatsAppChannel::new(config.whatsapp.clone()));

    let state = AppState::new(
        config,
        assistant,
        speech.clone(),
        whatsapp,
        Arc::new(MediaCache::default()),
    )
    .with_channel(channel.clone());

    Harness {
        state: Arc::new(state),
        provider,
        search,
        speech,
        channel,
    }
}

pub fn harness() -> Harness {
    harness_with(test_config(), account_docs(), FakeSpeech::default())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "teller-test-boundary";

/// Multipart request with an optional `file` part and an optional `text` part.
pub fn post_multipart(uri: &str, file: Option<(&str, &str, &[u8])>, text: Option<&str>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(text) = text {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\n{text}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}
