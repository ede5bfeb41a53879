use axum::{Json, extract::State, response::IntoResponse};
use tracing::{debug, info};

use chirp_db::Database;
use chirp_types::api::{LoginRequest, LoginResponse};
use chirp_types::models::User;

use crate::error::{ApiError, AuthError};
use crate::password::verify_password;
use crate::state::{AppState, run_blocking};
use crate::token::TokenService;

/// Check credentials and issue a session token. An unknown email and a
/// wrong password produce the same error.
pub fn login(
    db: &Database,
    tokens: &TokenService,
    email: &str,
    password: &str,
    ttl_secs: Option<i64>,
) -> Result<(User, String), ApiError> {
    let user = match db.get_user_by_email(email) {
        Ok(user) => user,
        Err(e) if e.is_not_found() => {
            debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_password(password, &user.password) {
        debug!("Wrong password for user {}", user.id);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = tokens.issue(user.id, ttl_secs.unwrap_or(0))?;
    info!("User {} logged in", user.id);
    Ok((user, token))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = run_blocking(move || {
        login(
            &state.db,
            &state.tokens,
            &req.email,
            &req.password,
            req.expires_in_seconds,
        )
    })
    .await?;

    Ok(Json(LoginResponse {
        id: user.id,
        email: user.email,
        is_chirpy_red: user.is_chirpy_red,
        token,
    }))
}
