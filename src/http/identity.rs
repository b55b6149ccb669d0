//! Caller identity.
//!
//! Authentication happens upstream of the gateway; the auth collaborator
//! forwards the verified user id in `X-User-ID`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::http::response::respond;

pub const X_USER_ID: &str = "x-user-id";

/// Authenticated caller, extracted from `X-User-ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity(pub Uuid);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRejection {
    Missing,
    Malformed,
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        match self {
            IdentityRejection::Missing => respond(StatusCode::UNAUTHORIZED, "Unauthorized", None),
            IdentityRejection::Malformed => {
                respond(StatusCode::BAD_REQUEST, "Error parse uuid", None)
            }
        }
    }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(X_USER_ID)
            .ok_or(IdentityRejection::Missing)?;
        let raw = value.to_str().map_err(|_| IdentityRejection::Malformed)?;
        if raw.trim().is_empty() {
            return Err(IdentityRejection::Missing);
        }
        Uuid::parse_str(raw.trim())
            .map(CallerIdentity)
            .map_err(|_| IdentityRejection::Malformed)
    }
}
