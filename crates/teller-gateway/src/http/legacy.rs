//! Single-purpose endpoints kept for existing integrations.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use teller_core::TellerError;
use teller_voice::SpeechAudio;

use crate::app::AppState;
use crate::error::ApiError;

use super::upload::read_form;

fn audio_response(audio: SpeechAudio) -> Response {
    ([(header::CONTENT_TYPE, audio.content_type())], audio.bytes).into_response()
}

/// POST /text: `{"text": ...}` in, `{"text": answer}` out.
pub async fn text_reply(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let text = payload
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::bad_request("Missing text"));
    }

    let answer = state.assistant.process_query(text).await;
    Ok(Json(json!({ "text": answer })))
}

/// POST /audio: multipart `file` in, synthesized answer bytes out.
pub async fn audio_reply(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let file = read_form(multipart?)
        .await?
        .file
        .filter(|f| !f.bytes.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing audio file"))?;

    let transcript = state
        .speech
        .transcribe(file.into_request())
        .await
        .map_err(TellerError::from)?;
    let answer = state.assistant.process_query(&transcript).await;
    let audio = state
        .speech
        .synthesize(&answer)
        .await
        .map_err(TellerError::from)?;

    Ok(audio_response(audio))
}

#[derive(Debug, Deserialize)]
pub struct TtsQuery {
    pub text: Option<String>,
}

/// GET /tts?text=: raw text-to-speech.
pub async fn tts(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TtsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let text = query.text.unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::bad_request("Missing text"));
    }

    let audio = state
        .speech
        .synthesize(&text)
        .await
        .map_err(TellerError::from)?;
    Ok(audio_response(audio))
}
