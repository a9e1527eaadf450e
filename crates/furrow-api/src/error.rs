use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// The error taxonomy every messaging operation speaks. Each kind maps to
/// one HTTP status, and the kind string is part of the response body so
/// callers can pattern-match without sniffing status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input: empty content, self-addressed message, bad fields.
    #[error("{0}")]
    Validation(String),

    /// The caller is not who the operation requires (e.g. marking someone
    /// else's message as read).
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is known but may not start this conversation.
    #[error("{0}")]
    Forbidden(String),

    /// A referenced user or message does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation, e.g. registering an email twice.
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected. Details are logged, never sent to the client.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(e) => {
                error!("internal error: {:#}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": self.kind(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}
