use serde::{Deserialize, Serialize};

/// Canonical inbound unit produced by a channel adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Platform-scoped sender identifier (WhatsApp id, phone number, ...).
    pub sender_id: String,
    pub kind: MessageKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    Text { text: String },
    Audio { media: MediaRef },
}

/// Opaque provider media identifier, resolved later by `download_media`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: String,
    pub mime_type: Option<String>,
}

impl Message {
    pub fn text(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            kind: MessageKind::Text { text: text.into() },
        }
    }

    pub fn audio(
        sender_id: impl Into<String>,
        media_id: impl Into<String>,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            kind: MessageKind::Audio {
                media: MediaRef {
                    id: media_id.into(),
                    mime_type,
                },
            },
        }
    }
}

/// One retrieved snippet. A `RetrievedContext` keeps provider ranking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub source: String,
    pub content: String,
    pub score: f64,
}

pub type RetrievedContext = Vec<ContextItem>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_kind_serializes_with_type_tag() {
        let msg = Message::audio("923001234567", "media-1", Some("audio/ogg".into()));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"]["type"], "audio");
        assert_eq!(json["kind"]["media"]["id"], "media-1");

        let text = Message::text("923001234567", "hello");
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["kind"]["type"], "text");
        assert_eq!(json["kind"]["text"], "hello");
    }
}
