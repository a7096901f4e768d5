use async_trait::async_trait;

use crate::error::SpeechError;
use crate::format::AudioFormat;

/// One audio upload to transcribe.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub audio: Vec<u8>,
    /// Upload filename. Also used to guess the content type when none is given.
    pub filename: String,
    pub content_type: Option<String>,
    /// Overrides the configured language hint. `auto` omits it.
    pub language: Option<String>,
}

impl TranscribeRequest {
    pub fn new(audio: Vec<u8>, filename: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            audio,
            filename: filename.into(),
            content_type,
            language: None,
        }
    }
}

/// Synthesized speech plus the format it was requested in.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

impl SpeechAudio {
    pub fn content_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

#[async_trait]
pub trait SpeechGateway: Send + Sync {
    /// Transcribe audio to trimmed text. Silence yields an empty string.
    async fn transcribe(&self, req: TranscribeRequest) -> Result<String, SpeechError>;

    /// Synthesize `text` with the configured voice and format.
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, SpeechError>;
}
