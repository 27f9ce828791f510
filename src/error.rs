//! API error taxonomy and HTTP response mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No authenticated user on the request (401)
    #[error("Unauthorized: missing or invalid user identity")]
    Unauthorized,

    /// Item type is not song/album/artist (400)
    #[error("Invalid item type: {0}")]
    InvalidItemType(String),

    /// Empty catalog item id (400)
    #[error("Invalid item id: must be a non-empty catalog id")]
    InvalidItemId,

    /// Empty artist id on the top-songs path (400)
    #[error("Invalid artist id: must be a non-empty catalog id")]
    InvalidArtistId,

    /// Review body over the word limit (400)
    #[error("Review text too long: {words} words (limit {limit})")]
    TextTooLong { words: usize, limit: usize },

    /// Upsert carried neither a valid rating nor text (400)
    #[error("Empty review: provide a rating or review text")]
    EmptyReview,

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Generic internal error (500)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
            ApiError::InvalidItemType(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_ITEM_TYPE", self.to_string())
            }
            ApiError::InvalidItemId => {
                (StatusCode::BAD_REQUEST, "INVALID_ITEM_ID", self.to_string())
            }
            ApiError::InvalidArtistId => {
                (StatusCode::BAD_REQUEST, "INVALID_ARTIST_ID", self.to_string())
            }
            ApiError::TextTooLong { .. } => {
                (StatusCode::BAD_REQUEST, "TEXT_TOO_LONG", self.to_string())
            }
            ApiError::EmptyReview => {
                (StatusCode::BAD_REQUEST, "EMPTY_REVIEW", self.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Internal(err) => {
                tracing::error!("Internal error on API path: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
