//! WhatsApp webhook: subscription handshake and event delivery.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use teller_whatsapp::{parse_message, verify_subscription, VerifyQuery};

use crate::app::AppState;
use crate::dispatch;

/// GET /webhook: echo `hub.challenge` as text/plain, or 403.
pub async fn webhook_verify(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    match verify_subscription(&query, &state.config.whatsapp) {
        Some(challenge) => {
            info!("webhook subscription verified");
            ([(header::CONTENT_TYPE, "text/plain")], challenge).into_response()
        }
        None => {
            warn!(mode = ?query.mode, "webhook verification rejected");
            (
                StatusCode::FORBIDDEN,
                [(header::CONTENT_TYPE, "text/plain")],
                "Forbidden",
            )
                .into_response()
        }
    }
}

/// POST /webhook: always `{"ok": true}`.
///
/// Malformed bodies and deliveries without a usable message are acknowledged
/// and dropped. A usable message is answered by a detached task; this
/// handler never waits for it.
pub async fn webhook_events(State(state): State<Arc<AppState>>, body: Bytes) -> Json<Value> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "ignoring malformed webhook body");
            return ack();
        }
    };

    info!(bytes = body.len(), "webhook payload received");

    if let Some(message) = parse_message(&payload) {
        dispatch::spawn_reply(state, message);
    }
    ack()
}

fn ack() -> Json<Value> {
    Json(json!({ "ok": true }))
}
