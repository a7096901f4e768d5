use axum::Json;
use serde_json::{json, Value};

/// GET /health: liveness probe.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "ok": true,
        "version": "2.0",
        "rag": "Azure AI Search",
    }))
}
