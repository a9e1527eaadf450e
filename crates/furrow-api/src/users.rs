use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use anyhow::anyhow;
use serde::Deserialize;
use uuid::Uuid;

use furrow_types::api::{Claims, ContactsResponse};
use furrow_types::models::{Role, UserProfile};

use crate::auth::AppState;
use crate::contacts;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: Role,
}

/// User Directory surface: look up one profile. Messaging never caches
/// these; they are resolved per request.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state.clone();
    let row = tokio::task::spawn_blocking(move || state.db.get_user_by_id(&user_id.to_string()))
        .await
        .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??
        .ok_or_else(|| ApiError::NotFound(format!("no user {}", user_id)))?;

    let role = Role::parse(&row.role)
        .ok_or_else(|| ApiError::Internal(anyhow!("corrupt role '{}' for user '{}'", row.role, row.id)))?;

    Ok(Json(UserProfile {
        id: user_id,
        role,
        display_name: row.display_name,
    }))
}

/// Directory listing by role, used by contact pickers (e.g. a customer
/// browsing growers to message).
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        state.db.list_users_by_role(query.role.as_str())
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    let profiles = rows
        .into_iter()
        .map(|row| {
            let role = Role::parse(&row.role).ok_or_else(|| {
                ApiError::Internal(anyhow!("corrupt role '{}' for user '{}'", row.role, row.id))
            })?;
            Ok(UserProfile {
                id: row
                    .id
                    .parse()
                    .map_err(|e| ApiError::Internal(anyhow!("corrupt user id '{}': {}", row.id, e)))?,
                role,
                display_name: row.display_name,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(profiles))
}

/// Which roles the caller may target with a first message. Continuing an
/// existing thread is always allowed and not reflected here.
pub async fn eligible_contacts(
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ContactsResponse {
        may_start: contacts::may_start(claims.role).to_vec(),
    }))
}
