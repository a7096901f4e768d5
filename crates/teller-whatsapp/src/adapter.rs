//! WhatsApp Cloud API channel adapter.
//!
//! Every operation is one or two plain HTTPS calls to the Graph API,
//! authenticated with the long-lived `ACCESS_TOKEN` as a bearer token.
//! Settings are read at call time so a partially configured deployment can
//! still serve the endpoints that do not need them.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use teller_channels::{Channel, ChannelError, OutboundContent, OutboundMessage};
use teller_core::config::WhatsAppConfig;
use teller_core::types::MediaRef;

pub struct WhatsAppChannel {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

#[derive(Debug, Deserialize)]
struct MediaMetadata {
    url: Option<String>,
}

impl WhatsAppChannel {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }

    fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.config.media_timeout_secs)
    }

    /// Inspect the configured access token via the Graph `debug_token` endpoint,
    /// authenticated with the app access token `{app_id}|{app_secret}`.
    pub async fn debug_access_token(&self) -> Result<Value, ChannelError> {
        let input_token = self.config.access_token()?;
        let app_token = format!("{}|{}", self.config.app_id()?, self.config.app_secret()?);
        let url = format!("{}/debug_token", self.config.graph_base());

        let resp = self
            .client
            .get(&url)
            .query(&[("input_token", input_token), ("access_token", app_token.as_str())])
            .timeout(self.send_timeout())
            .send()
            .await
            .map_err(transport)?;
        let resp = ensure_success(resp, "debug_token").await?;

        resp.json()
            .await
            .map_err(|e| ChannelError::Transport(format!("invalid debug_token response: {e}")))
    }
}

/// JSON body for the `/{phone_number_id}/messages` endpoint.
fn message_body(msg: &OutboundMessage) -> Value {
    match &msg.content {
        OutboundContent::Text { body } => json!({
            "messaging_product": "whatsapp",
            "to": msg.recipient_id,
            "type": "text",
            "text": { "body": body },
        }),
        OutboundContent::AudioLink { link } => json!({
            "messaging_product": "whatsapp",
            "to": msg.recipient_id,
            "type": "audio",
            "audio": { "link": link },
        }),
    }
}

fn transport(e: reqwest::Error) -> ChannelError {
    ChannelError::Transport(e.to_string())
}

/// Turn a non-2xx response into `ChannelError::Api` carrying the raw body.
async fn ensure_success(
    resp: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, ChannelError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %body, operation, "WhatsApp API error");
    Err(ChannelError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        let url = format!(
            "{}/{}/messages",
            self.config.graph_base(),
            self.config.phone_number_id()?
        );
        let token = self.config.access_token()?;

        debug!(to = %msg.recipient_id, "sending WhatsApp message");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.send_timeout())
            .json(&message_body(msg))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(resp, "send").await?;
        Ok(())
    }

    async fn download_media(&self, media: &MediaRef) -> Result<Vec<u8>, ChannelError> {
        let token = self.config.access_token()?;
        let meta_url = format!("{}/{}", self.config.graph_base(), media.id);

        let resp = self
            .client
            .get(&meta_url)
            .bearer_auth(token)
            .timeout(self.media_timeout())
            .send()
            .await
            .map_err(transport)?;
        let meta: MediaMetadata = ensure_success(resp, "media metadata")
            .await?
            .json()
            .await
            .map_err(|e| ChannelError::Media(format!("invalid media metadata: {e}")))?;

        let download_url = meta
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ChannelError::Media("WhatsApp media metadata missing URL".to_string()))?;

        let resp = self
            .client
            .get(&download_url)
            .bearer_auth(token)
            .timeout(self.media_timeout())
            .send()
            .await
            .map_err(transport)?;
        let bytes = ensure_success(resp, "media download")
            .await?
            .bytes()
            .await
            .map_err(transport)?;

        debug!(media_id = %media.id, bytes = bytes.len(), "downloaded WhatsApp media");
        Ok(bytes.to_vec())
    }
}
