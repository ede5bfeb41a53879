use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
};
use tracing::{debug, info};

use chirp_db::Database;
use chirp_types::api::WebhookRequest;

use crate::error::{ApiError, AuthError};
use crate::middleware::credential;
use crate::state::{AppState, run_blocking};

/// The only event that changes state.
pub const USER_UPGRADED: &str = "user.upgraded";

/// Apply one payment-provider event. Unknown events are accepted and
/// ignored; redelivery of an upgrade is harmless.
pub fn handle(
    db: &Database,
    expected_key: &str,
    presented_key: &str,
    event: &str,
    user_id: u64,
) -> Result<(), ApiError> {
    if presented_key != expected_key {
        return Err(AuthError::InvalidApiKey.into());
    }

    if event != USER_UPGRADED {
        debug!("Ignoring webhook event {:?}", event);
        return Ok(());
    }

    db.set_chirpy_red(user_id, true)?;
    info!("User {} upgraded to Chirpy Red", user_id);
    Ok(())
}

/// A caller presenting the configured `ApiKey`. Extracted from the
/// headers alone, so a bad key is rejected before the body is parsed.
#[derive(Debug, Clone)]
pub struct PolkaKey(pub String);

impl FromRequestParts<AppState> for PolkaKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = credential(&parts.headers, "ApiKey")?;
        if key != state.polka_key {
            debug!("Rejected webhook with wrong api key");
            return Err(AuthError::InvalidApiKey.into());
        }
        Ok(PolkaKey(key.to_string()))
    }
}

pub async fn polka_webhook(
    State(state): State<AppState>,
    PolkaKey(key): PolkaKey,
    Json(req): Json<WebhookRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = match req.data {
        Some(data) => data.user_id,
        None if req.event == USER_UPGRADED => {
            return Err(ApiError::validation("Missing data.user_id"));
        }
        None => {
            debug!("Ignoring webhook event {:?}", req.event);
            return Ok(StatusCode::NO_CONTENT);
        }
    };

    run_blocking(move || handle(&state.db, &state.polka_key, &key, &req.event, user_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
