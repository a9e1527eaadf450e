use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use anyhow::anyhow;
use uuid::Uuid;

use furrow_types::api::{Claims, SendMessageRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::messaging;

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.sub;

    // Run blocking DB work off the async runtime
    let state = state.clone();
    let message = tokio::task::spawn_blocking(move || {
        messaging::send(&state.db, caller, req.recipient_id, &req.content, req.sent_at)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_message_read(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.sub;

    let state = state.clone();
    tokio::task::spawn_blocking(move || messaging::mark_read(&state.db, caller, message_id))
        .await
        .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.sub;

    let state = state.clone();
    let conversations =
        tokio::task::spawn_blocking(move || messaging::list_conversations(&state.db, caller))
            .await
            .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(conversations))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(other_user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.sub;

    let state = state.clone();
    let thread = tokio::task::spawn_blocking(move || {
        messaging::get_conversation(&state.db, caller, other_user_id)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(thread))
}
