//! Inbound side of the WhatsApp Cloud API: payload normalization and the
//! subscription handshake.
//!
//! A delivery looks like `{entry:[{changes:[{value:{messages:[...]}}]}]}` and
//! may carry zero or many messages (status-only deliveries carry none).

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use teller_core::config::WhatsAppConfig;
use teller_core::types::Message;

#[derive(Debug, Deserialize)]
struct RawMessage {
    from: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<TextBody>,
    audio: Option<AudioBody>,
    button: Option<ButtonBody>,
    interactive: Option<Interactive>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AudioBody {
    id: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ButtonBody {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Interactive {
    button_reply: Option<Reply>,
    list_reply: Option<Reply>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    title: Option<String>,
}

/// Return the first supported message in traversal order, or `None`.
///
/// Button and interactive replies are normalized to text using their label.
/// Messages without a sender, blank text, audio without a media id, and
/// objects that do not match the expected shape are skipped.
pub fn parse_message(payload: &Value) -> Option<Message> {
    iter_messages(payload).find_map(normalize)
}

fn iter_messages(payload: &Value) -> impl Iterator<Item = &Value> {
    array(payload, "entry")
        .flat_map(|entry| array(entry, "changes"))
        .flat_map(|change| array(&change["value"], "messages"))
        .filter(|message| message.is_object())
}

fn array<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

fn normalize(value: &Value) -> Option<Message> {
    let raw: RawMessage = match serde_json::from_value(value.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "skipping malformed webhook message");
            return None;
        }
    };

    let sender = raw.from.filter(|s| !s.is_empty())?;

    match raw.kind.as_deref()? {
        "audio" => {
            let audio = raw.audio?;
            let media_id = audio.id.filter(|id| !id.is_empty())?;
            let mime_type = audio.mime_type.filter(|m| !m.is_empty());
            Some(Message::audio(sender, media_id, mime_type))
        }
        "text" => non_blank(raw.text?.body?).map(|text| Message::text(sender, text)),
        "button" => non_blank(raw.button?.text?).map(|text| Message::text(sender, text)),
        "interactive" => {
            let interactive = raw.interactive?;
            let reply = interactive.button_reply.or(interactive.list_reply)?;
            non_blank(reply.title?).map(|title| Message::text(sender, title))
        }
        other => {
            debug!(kind = other, "ignoring unsupported message type");
            None
        }
    }
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Query parameters of the `GET /webhook` subscription handshake.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Echo the challenge iff mode is `subscribe` and the token matches.
/// `None` means the caller must answer 403.
pub fn verify_subscription(query: &VerifyQuery, config: &WhatsAppConfig) -> Option<String> {
    if query.mode.as_deref() != Some("subscribe") {
        return None;
    }
    let token = query.verify_token.as_deref()?;
    if !config.verify_token_matches(token) {
        return None;
    }
    query.challenge.clone().filter(|c| !c.is_empty())
}
