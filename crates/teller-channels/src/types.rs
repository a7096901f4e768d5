use serde::{Deserialize, Serialize};

/// A message to be delivered to an external channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Platform-native identifier for the recipient (WhatsApp id, phone number).
    pub recipient_id: String,
    pub content: OutboundContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundContent {
    Text { body: String },
    /// Audio the platform fetches from `link`. Must point at our own media endpoint.
    AudioLink { link: String },
}

impl OutboundMessage {
    pub fn text(recipient: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient.into(),
            content: OutboundContent::Text { body: body.into() },
        }
    }

    pub fn audio_link(recipient: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient.into(),
            content: OutboundContent::AudioLink { link: link.into() },
        }
    }
}
