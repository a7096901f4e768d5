//! Azure OpenAI speech deployments (`gpt-4o-mini-transcribe`, `gpt-4o-mini-tts`).
//!
//! Transcription is a multipart upload to `/audio/transcriptions`, synthesis a
//! JSON request to `/audio/speech`. Both share the Azure OpenAI endpoint and
//! `api-key` with the completion provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use teller_core::config::{AzureConfig, SpeechConfig};

use crate::error::SpeechError;
use crate::format::{guess_mime, AudioFormat};
use crate::gateway::{SpeechAudio, SpeechGateway, TranscribeRequest};

const STT: &str = "Azure STT";
const TTS: &str = "Azure TTS";

pub struct AzureSpeech {
    client: reqwest::Client,
    azure: AzureConfig,
    speech: SpeechConfig,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

impl AzureSpeech {
    pub fn new(azure: AzureConfig, speech: SpeechConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            azure,
            speech,
        }
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat::new(self.speech.format.clone())
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> Result<String, SpeechError> {
        Ok(format!(
            "{}/openai/deployments/{}/audio/{}",
            self.azure.endpoint()?,
            deployment,
            operation
        ))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.speech.timeout_secs)
    }
}

/// Effective language hint, or `None` for provider auto-detection.
fn language_hint(requested: Option<&str>, configured: &str) -> Option<String> {
    let lang = requested.unwrap_or(configured).trim().to_lowercase();
    if lang.is_empty() || lang == "auto" {
        None
    } else {
        Some(lang)
    }
}

async fn ensure_success(
    resp: reqwest::Response,
    service: &'static str,
) -> Result<reqwest::Response, SpeechError> {
    let status = resp.status().as_u16();
    if resp.status().is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    warn!(status, body = %message, service, "speech API error");
    Err(SpeechError::Api {
        service,
        status,
        message,
    })
}

fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> SpeechError {
    move |e| SpeechError::Http {
        service,
        message: e.to_string(),
    }
}

#[async_trait]
impl SpeechGateway for AzureSpeech {
    async fn transcribe(&self, req: TranscribeRequest) -> Result<String, SpeechError> {
        let url = self.deployment_url(&self.speech.stt_deployment, "transcriptions")?;
        let api_key = self.azure.api_key()?;

        let filename = if req.filename.trim().is_empty() {
            "audio".to_string()
        } else {
            req.filename.clone()
        };
        let mime = req
            .content_type
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| guess_mime(&filename).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let part = reqwest::multipart::Part::bytes(req.audio)
            .file_name(filename)
            .mime_str(&mime)
            .map_err(http(STT))?;
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(lang) = language_hint(req.language.as_deref(), &self.speech.language) {
            form = form.text("language", lang);
        }

        debug!(deployment = %self.speech.stt_deployment, mime = %mime, "transcribing audio");

        let resp = self
            .client
            .post(&url)
            .query(&[("api-version", self.azure.api_version.as_str())])
            .header("api-key", api_key)
            .timeout(self.timeout())
            .multipart(form)
            .send()
            .await
            .map_err(http(STT))?;

        let body: TranscriptionResponse = ensure_success(resp, STT)
            .await?
            .json()
            .await
            .map_err(|e| SpeechError::Parse {
                service: STT,
                message: e.to_string(),
            })?;

        Ok(body.text.unwrap_or_default().trim().to_string())
    }

    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, SpeechError> {
        let deployment = &self.speech.tts_deployment;
        let url = self.deployment_url(deployment, "speech")?;
        let api_key = self.azure.api_key()?;
        let format = self.format();

        let body = json!({
            "model": deployment,
            "input": text,
            "voice": self.speech.voice,
            "format": format.as_str(),
        });

        debug!(deployment = %deployment, chars = text.len(), "synthesizing speech");

        let resp = self
            .client
            .post(&url)
            .query(&[("api-version", self.azure.api_version.as_str())])
            .header("api-key", api_key)
            .timeout(self.timeout())
            .json(&body)
            .send()
            .await
            .map_err(http(TTS))?;

        let bytes = ensure_success(resp, TTS)
            .await?
            .bytes()
            .await
            .map_err(http(TTS))?;

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
            format,
        })
    }
}
