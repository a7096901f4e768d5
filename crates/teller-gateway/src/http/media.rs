use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /media/{id}: cached voice reply, fetched by the messaging platform.
pub async fn media_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let entry = state
        .media
        .get(&id)
        .ok_or_else(|| ApiError::not_found("Not found"))?;
    Ok(([(header::CONTENT_TYPE, entry.content_type)], entry.buffer).into_response())
}
