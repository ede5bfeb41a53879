//! Authorization gate for mutating endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use tracing::debug;

use crate::error::{ApiError, AuthError};
use crate::state::AppState;
use crate::token::TokenService;

/// Pull the credential out of `Authorization: <scheme> <credential>`.
/// Everything after the single separating space is returned verbatim.
/// Absent, non-UTF-8 or wrongly prefixed headers are all reported as a
/// missing credential.
pub fn credential<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(scheme))
        .and_then(|v| v.strip_prefix(' '))
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingCredential)
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    credential(headers, "Bearer")
}

/// Validate the bearer token in `headers` and return the caller's user id.
pub fn authorize(headers: &HeaderMap, tokens: &TokenService) -> Result<u64, AuthError> {
    let token = bearer_token(headers)?;
    tokens.validate(token).inspect_err(|e| debug!("Rejected bearer token: {}", e))
}

/// The authenticated caller. Declaring this in a handler's arguments gates
/// the handler behind a valid session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub u64);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = authorize(&parts.headers, &state.tokens)?;
        Ok(AuthUser(user_id))
    }
}
