//! WhatsApp operator utilities.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use teller_core::TellerError;
use teller_whatsapp::Diagnostics;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct DiagnoseQuery {
    #[serde(default)]
    pub check_token: bool,
}

/// GET /whatsapp/diagnose?check_token=bool
pub async fn diagnose(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DiagnoseQuery>, QueryRejection>,
) -> Result<Json<Diagnostics>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.whatsapp.diagnose(query.check_token).await))
}

/// String or number field, trimmed; blank counts as absent.
fn field(payload: &Value, name: &str) -> Option<String> {
    let raw = match payload.get(name)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(raw).filter(|s| !s.is_empty())
}

/// POST /whatsapp/push `{text, to?}`: send a text to `to` or the
/// configured recipient override.
pub async fn push(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let text = field(&payload, "text").ok_or_else(|| ApiError::bad_request("Missing text"))?;
    let recipient = field(&payload, "to")
        .or_else(|| state.config.whatsapp.recipient_override().map(str::to_string))
        .ok_or_else(|| ApiError::bad_request("Missing RECIPIENT_WAID or 'to' value"))?;

    state
        .channel
        .send_text(&recipient, &text)
        .await
        .map_err(TellerError::from)?;

    info!(chars = text.len(), "pushed WhatsApp message");
    Ok(Json(json!({ "ok": true })))
}
