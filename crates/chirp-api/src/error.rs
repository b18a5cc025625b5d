use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use chirp_db::error::StoreError;
use chirp_db::tweets::CONTENT_MAX_CHARS;

/// Request-level failures, rendered as a JSON error body with a status code.
/// Validation problems carry the offending field so the client can attach
/// the message to the right form input.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("forbidden")]
    Forbidden,

    #[error("missing or invalid credentials")]
    Unauthorized,

    #[error("conflicting concurrent update")]
    Conflict,

    #[error("internal error")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound { username } => {
                ApiError::NotFound(format!("user not found: {username}"))
            }
            StoreError::TweetNotFound { tweet_id } => {
                ApiError::NotFound(format!("tweet not found: {tweet_id}"))
            }
            StoreError::NotTweetAuthor { .. } => ApiError::Forbidden,
            StoreError::UsernameTaken { .. } => {
                ApiError::validation("username", "this username is already registered")
            }
            StoreError::ContentLength { chars: 0 } => {
                ApiError::validation("content", "content is required")
            }
            StoreError::ContentLength { chars } => ApiError::validation(
                "content",
                format!("content must be at most {CONTENT_MAX_CHARS} characters (got {chars})"),
            ),
            StoreError::SelfIntroLength { chars } => ApiError::validation(
                "self_intro",
                format!("self introduction must be at most 252 characters (got {chars})"),
            ),
            // Conflict-class business rules are normally intercepted by the
            // follow handlers and rendered as no-op warnings; anything that
            // reaches this point is a store-level race.
            StoreError::SelfFollow
            | StoreError::AlreadyFollowing { .. }
            | StoreError::NotFollowing { .. }
            | StoreError::Conflict => ApiError::Conflict,
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Conflict => (StatusCode::CONFLICT, "conflict"),
            ApiError::Internal(err) => {
                error!("request failed: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        let body = match &self {
            ApiError::Validation { field, message } => json!({
                "error": { "code": code, "field": field, "message": message }
            }),
            other => json!({
                "error": { "code": code, "message": other.to_string() }
            }),
        };

        (status, Json(body)).into_response()
    }
}
