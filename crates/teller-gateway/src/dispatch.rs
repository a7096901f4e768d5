//! Detached webhook replies.
//!
//! The webhook handler acknowledges first and hands the message to
//! `spawn_reply`. The reply runs in its own task; a supervisor task awaits it
//! and is the only place its outcome is observed. Failures are logged and
//! never reach the sender.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use teller_core::{Message, MessageKind, TellerError};
use teller_voice::TranscribeRequest;

use crate::app::AppState;

/// Run the full reply flow for one inbound message.
///
/// Text is answered with text. Voice is answered with voice: download,
/// transcribe, answer, synthesize, park in the media cache and send its
/// public URL.
pub async fn reply(state: &AppState, message: Message) -> Result<(), TellerError> {
    let recipient = state
        .config
        .whatsapp
        .recipient_override()
        .unwrap_or(&message.sender_id)
        .to_string();

    match message.kind {
        MessageKind::Text { text } => {
            let answer = state.assistant.process_query(&text).await;
            state.channel.send_text(&recipient, &answer).await?;
        }
        MessageKind::Audio { media } => {
            let audio = state.channel.download_media(&media).await?;
            let transcript = state
                .speech
                .transcribe(TranscribeRequest::new(audio, "audio", media.mime_type.clone()))
                .await?;
            info!(chars = transcript.len(), "voice message transcribed");

            let answer = state.assistant.process_query(&transcript).await;
            let speech = state.speech.synthesize(&answer).await?;
            let content_type = speech.content_type();
            let id = state.media.put(speech.bytes, content_type);
            let url = state.config.whatsapp.media_url(&id)?;
            state.channel.send_audio_by_url(&recipient, &url).await?;
        }
    }
    Ok(())
}

/// Spawn `reply` detached. The returned handle belongs to the supervisor and
/// resolves once the outcome has been logged; callers normally drop it.
pub fn spawn_reply(state: Arc<AppState>, message: Message) -> JoinHandle<()> {
    let sender = message.sender_id.clone();
    let work = tokio::spawn(async move { reply(&state, message).await });

    tokio::spawn(async move {
        match work.await {
            Ok(Ok(())) => debug!(sender = %sender, "webhook reply delivered"),
            Ok(Err(e)) => warn!(
                sender = %sender,
                code = e.code(),
                error = %e,
                "webhook reply failed"
            ),
            Err(e) if e.is_panic() => error!(sender = %sender, "webhook reply task panicked"),
            Err(e) => warn!(sender = %sender, error = %e, "webhook reply task cancelled"),
        }
    })
}
