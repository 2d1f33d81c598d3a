//! Authenticated user id forwarded by the upstream auth layer.

use crate::errors::AppError;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf the request runs.
///
/// Authentication itself happens in front of this service (gateway or
/// middleware); handlers only need the resulting id to scope reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| {
                AppError::Unauthorized(format!("Missing {USER_ID_HEADER} header")).into_response()
            })?
            .to_str()
            .map_err(|_| {
                AppError::Unauthorized(format!("Malformed {USER_ID_HEADER} header")).into_response()
            })?;

        Uuid::parse_str(raw.trim()).map(CurrentUser).map_err(|_| {
            AppError::Unauthorized(format!("Malformed {USER_ID_HEADER} header")).into_response()
        })
    }
}
