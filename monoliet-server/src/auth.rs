//! Bearer token authentication for portal requests
//!
//! The portal authenticates its own users; this service only checks that a
//! plausible bearer token is present. Any token of at least
//! [`MIN_TOKEN_LEN`] characters is accepted.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;

pub const MIN_TOKEN_LEN: usize = 10;

/// Extractor guarding every authenticated route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalToken(pub String);

/// Validate an `Authorization` header value
pub fn parse_bearer(header: Option<&str>) -> Result<PortalToken, ApiError> {
    let header = match header {
        Some(h) if !h.trim().is_empty() => h.trim_start(),
        _ => return Err(ApiError::Unauthorized("Missing authorization header")),
    };

    let (scheme, token) = header
        .split_once(char::is_whitespace)
        .map(|(scheme, rest)| (scheme, rest.trim_start()))
        .filter(|(_, rest)| !rest.is_empty())
        .ok_or(ApiError::Unauthorized(
            "Invalid authorization header format. Use 'Bearer <token>'",
        ))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Unauthorized(
            "Invalid authentication scheme. Use 'Bearer <token>'",
        ));
    }

    if token.chars().count() < MIN_TOKEN_LEN {
        return Err(ApiError::Unauthorized("Invalid token"));
    }

    Ok(PortalToken(token.to_string()))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for PortalToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(AUTHORIZATION) {
            None => parse_bearer(None),
            Some(value) => match value.to_str() {
                Ok(raw) => parse_bearer(Some(raw)),
                Err(_) => Err(ApiError::Unauthorized(
                    "Invalid authorization header format. Use 'Bearer <token>'",
                )),
            },
        }
    }
}
