//! Session token issuance and validation (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use chirp_types::api::Claims;

use crate::error::{ApiError, AuthError};

/// `iss` claim on every token this service signs.
pub const ISSUER: &str = "chirpy";

/// Upper bound on token lifetime, and the default when none is requested.
pub const MAX_TTL_SECS: i64 = 24 * 60 * 60;

/// Clamp a requested lifetime to `(0, MAX_TTL_SECS]`; zero or negative
/// means the maximum.
pub fn effective_ttl(requested_secs: i64) -> i64 {
    if requested_secs <= 0 {
        MAX_TTL_SECS
    } else {
        requested_secs.min(MAX_TTL_SECS)
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: u64, requested_ttl_secs: i64) -> Result<String, ApiError> {
        self.issue_at(user_id, requested_ttl_secs, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        user_id: u64,
        requested_ttl_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<String, ApiError> {
        let ttl = effective_ttl(requested_ttl_secs);
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("jwt encode: {e}")))
    }

    /// Verify signature, issuer and expiry, returning the subject's user id.
    pub fn validate(&self, token: &str) -> Result<u64, AuthError> {
        let claims = self.claims(token)?;
        claims.sub.parse().map_err(|_| AuthError::Malformed)
    }

    pub fn claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::Expired,
                JwtErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            })
    }
}
