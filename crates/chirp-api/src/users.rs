use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use chirp_db::{Database, UserUpdate};
use chirp_types::api::{CreateUserRequest, UpdateUserRequest, UserResponse};
use chirp_types::models::User;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::password::hash_password;
use crate::state::{AppState, run_blocking};

/// Register a new account. The store does not enforce unique emails, so the
/// lookup happens here; two racing signups for one email can both succeed.
pub fn signup(db: &Database, email: &str, password: &str) -> Result<User, ApiError> {
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    match db.get_user_by_email(email) {
        Ok(_) => return Err(ApiError::validation("Email is already registered")),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }

    let hash = hash_password(password)?;
    let user = db.create_user(email, &hash)?;
    info!("User {} registered", user.id);
    Ok(user)
}

/// Change the caller's email and/or password. An empty field counts as
/// not provided.
pub fn update(
    db: &Database,
    user_id: u64,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<User, ApiError> {
    let email = email.filter(|e| !e.is_empty());
    if let Some(email) = email {
        match db.get_user_by_email(email) {
            Ok(other) if other.id != user_id => {
                return Err(ApiError::validation("Email is already registered"));
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
    }

    let password_hash = password
        .filter(|p| !p.is_empty())
        .map(hash_password)
        .transpose()?;

    let user = db.update_user(
        user_id,
        UserUpdate {
            email: email.map(str::to_string),
            password_hash,
        },
    )?;
    info!("User {} updated", user.id);
    Ok(user)
}

// -- Handlers --

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(move || signup(&state.db, &req.email, &req.password)).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(move || {
        update(&state.db, user_id, req.email.as_deref(), req.password.as_deref())
    })
    .await?;
    Ok(Json(UserResponse::from(user)))
}
