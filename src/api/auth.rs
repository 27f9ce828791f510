//! Authenticated-user extraction.
//!
//! Session lifecycle lives in the fronting session layer; by the time a
//! request reaches this service, the verified user id rides in the
//! `X-User-Id` header. A missing or blank header is `Unauthorized`, and
//! every review operation is keyed by this identity only, so a caller can
//! never write or delete under someone else's id.

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller's opaque user id.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser(user_id.to_string()))
    }
}
