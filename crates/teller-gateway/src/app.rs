use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tracing::debug;

use teller_agent::Assistant;
use teller_channels::Channel;
use teller_core::{MediaCache, TellerConfig};
use teller_voice::SpeechGateway;
use teller_whatsapp::WhatsAppChannel;

use crate::http;

/// Largest accepted upload (the transcription service's own limit).
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Central shared state, passed as `Arc<AppState>` to all handlers and to
/// every detached webhook reply.
pub struct AppState {
    pub config: TellerConfig,
    pub assistant: Assistant,
    pub speech: Arc<dyn SpeechGateway>,
    /// Outbound messaging for replies and pushes.
    pub channel: Arc<dyn Channel>,
    /// Same adapter as `channel` in production; kept concrete for diagnostics.
    pub whatsapp: Arc<WhatsAppChannel>,
    pub media: Arc<MediaCache>,
}

impl AppState {
    pub fn new(
        config: TellerConfig,
        assistant: Assistant,
        speech: Arc<dyn SpeechGateway>,
        whatsapp: Arc<WhatsAppChannel>,
        media: Arc<MediaCache>,
    ) -> Self {
        Self {
            config,
            assistant,
            speech,
            channel: whatsapp.clone(),
            whatsapp,
            media,
        }
    }

    /// Route outbound messages through a different channel.
    pub fn with_channel(mut self, channel: Arc<dyn Channel>) -> Self {
        self.channel = channel;
        self
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(http::health::health_handler))
        .route("/message", post(http::message::unified_message))
        .route("/text", post(http::legacy::text_reply))
        .route("/audio", post(http::legacy::audio_reply))
        .route("/tts", get(http::legacy::tts))
        .route("/media/{id}", get(http::media::media_handler))
        .route(
            "/webhook",
            get(http::webhook::webhook_verify).post(http::webhook::webhook_events),
        )
        .route("/whatsapp/diagnose", get(http::whatsapp::diagnose))
        .route("/whatsapp/push", post(http::whatsapp::push))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Sweep expired media every `period`, on top of the sweep-on-access.
pub fn spawn_media_sweeper(media: Arc<MediaCache>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        loop {
            tick.tick().await;
            let removed = media.sweep();
            if removed > 0 {
                debug!(removed, remaining = media.len(), "media sweep");
            }
        }
    })
}
