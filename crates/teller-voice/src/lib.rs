//! Speech-to-text and text-to-speech behind one `SpeechGateway` trait.

pub mod azure;
pub mod error;
pub mod format;
pub mod gateway;

pub use azure::AzureSpeech;
pub use error::SpeechError;
pub use format::AudioFormat;
pub use gateway::{SpeechAudio, SpeechGateway, TranscribeRequest};
