use async_trait::async_trait;

use teller_core::types::MediaRef;

use crate::{error::ChannelError, types::OutboundMessage};

/// Common interface implemented by every messaging platform adapter.
///
/// Implementations must be `Send + Sync` so a single adapter can be shared
/// by the HTTP handlers and any number of detached reply tasks.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"whatsapp"`).
    fn name(&self) -> &str;

    /// Deliver a single outbound message. One HTTP call to the platform.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError>;

    /// Fetch the bytes behind an inbound media reference.
    async fn download_media(&self, media: &MediaRef) -> Result<Vec<u8>, ChannelError>;

    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        self.send(&OutboundMessage::text(recipient, text)).await
    }

    /// Send a voice reply the platform pulls from `url`.
    async fn send_audio_by_url(&self, recipient: &str, url: &str) -> Result<(), ChannelError> {
        self.send(&OutboundMessage::audio_link(recipient, url)).await
    }
}
