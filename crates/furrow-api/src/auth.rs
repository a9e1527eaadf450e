use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use anyhow::anyhow;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use furrow_db::Database;
use furrow_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use furrow_types::models::Role;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    let display_name = req.display_name.trim();
    if display_name.is_empty() || display_name.len() > 64 {
        return Err(ApiError::Validation("display name must be 1-64 characters".into()));
    }
    if !req.email.contains('@') || req.email.len() > 254 {
        return Err(ApiError::Validation("invalid email address".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation("password must be at least 8 characters".into()));
    }

    // Check if email is taken
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict("email already registered".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();

    state.db.create_user(
        &user_id.to_string(),
        &req.email,
        display_name,
        req.role.as_str(),
        &password_hash,
    )?;

    let token = create_token(&state.jwt_secret, user_id, req.role, display_name)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".into()))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("invalid credentials".into()))?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt user id '{}': {}", user.id, e)))?;
    let role = Role::parse(&user.role)
        .ok_or_else(|| ApiError::Internal(anyhow!("corrupt role '{}' for user '{}'", user.role, user.id)))?;

    let token = create_token(&state.jwt_secret, user_id, role, &user.display_name)?;

    Ok(Json(LoginResponse {
        user_id,
        display_name: user.display_name,
        role,
        token,
    }))
}

fn create_token(
    secret: &str,
    user_id: Uuid,
    role: Role,
    display_name: &str,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        role,
        display_name: display_name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow!("token encoding failed: {}", e)))?;

    Ok(token)
}
