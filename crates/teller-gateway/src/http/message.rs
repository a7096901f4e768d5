//! POST /message: unified text and voice endpoint for the browser client.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, FromRequest, Multipart, Query, Request, State},
    http::{header, HeaderMap},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::ApiError;

use super::upload::{read_form, Upload};

#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub text: Option<String>,
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

/// Accepts `?text=` and/or a multipart `file`. Non-empty audio takes
/// precedence and is transcribed first; an empty upload counts as absent.
///
/// Replies `{text, audio: {format, size_bytes, url}}`, or `{text, warning}`
/// when synthesis fails.
pub async fn unified_message(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MessageQuery>, QueryRejection>,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let mut text = query
        .text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let mut upload: Option<Upload> = None;

    if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &state).await?;
        let form = read_form(multipart).await?;
        text = text.or(form.text);
        upload = form.file;
    }

    if let Some(file) = upload.filter(|f| !f.bytes.is_empty()) {
        let transcript = state
            .speech
            .transcribe(file.into_request())
            .await
            .map_err(|e| {
                warn!(error = %e, "audio transcription failed");
                ApiError::bad_request("Failed to process audio").with_details(e.to_string())
            })?;
        info!(chars = transcript.len(), "transcribed audio");
        text = Some(transcript);
    }

    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Err(ApiError::bad_request("Please provide either text or audio"));
    };

    let answer = state.assistant.process_query(&text).await;

    match state.speech.synthesize(&answer).await {
        Ok(audio) => {
            let format = audio.content_type();
            let size_bytes = audio.bytes.len();
            let id = state.media.put(audio.bytes, format);
            Ok(Json(json!({
                "text": answer,
                "audio": {
                    "format": format,
                    "size_bytes": size_bytes,
                    "url": format!("/media/{id}"),
                },
            })))
        }
        Err(e) => {
            warn!(error = %e, "speech synthesis failed, replying with text only");
            Ok(Json(json!({
                "text": answer,
                "warning": "Audio generation failed",
            })))
        }
    }
}
