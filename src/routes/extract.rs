//! Request extractors shared by the route trees.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the opaque caller identifier.
///
/// Authentication itself is delegated to a fronting identity layer; this
/// backend only requires a stable, opaque id per caller.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the caller as asserted by the identity collaborator.
pub struct Caller(pub String);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.len() <= 128);

        match value {
            Some(user_id) => Ok(Caller(user_id.to_string())),
            None => Err(AppError::Unauthorized(format!(
                "missing or invalid `{USER_ID_HEADER}` header"
            ))),
        }
    }
}
