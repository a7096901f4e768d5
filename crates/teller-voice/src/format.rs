use serde::{Deserialize, Serialize};

/// TTS output format as configured (`mp3`, `opus`, ...), passed to the
/// provider verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFormat(String);

impl AudioFormat {
    pub fn new(format: impl Into<String>) -> Self {
        Self(format.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MP3 spellings map to `audio/mpeg`; everything else is served as Ogg.
    pub fn mime_type(&self) -> &'static str {
        match self.0.trim().to_ascii_lowercase().as_str() {
            "mp3" | "mpeg" | "audio/mpeg" => "audio/mpeg",
            _ => "audio/ogg",
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::new("mp3")
    }
}

/// Guess an upload content type from the filename extension.
pub fn guess_mime(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "ogg" | "oga" | "opus" => "audio/ogg",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "wav" => "audio/wav",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        "amr" => "audio/amr",
        "aac" => "audio/aac",
        _ => return None,
    };
    Some(mime)
}
