use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use chirp_db::Database;
use chirp_types::api::{ChirpListQuery, ChirpResponse, CreateChirpRequest};
use chirp_types::models::{Chirp, SortOrder};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::profanity;
use crate::state::{AppState, run_blocking};

pub const MAX_CHIRP_LEN: usize = 140;

/// Validate, mask and store a chirp. Length is counted in characters on
/// the raw body, before masking and without trimming.
pub fn submit(db: &Database, author_id: u64, raw_body: &str) -> Result<Chirp, ApiError> {
    let len = raw_body.chars().count();
    if len == 0 {
        return Err(ApiError::validation("Chirp is empty"));
    }
    if len > MAX_CHIRP_LEN {
        return Err(ApiError::validation("Chirp is too long"));
    }

    let body = profanity::clean(raw_body);
    let chirp = db.create_chirp(author_id, &body)?;
    info!("Chirp {} created by user {}", chirp.id, author_id);
    Ok(chirp)
}

/// Chirps ordered by id, optionally restricted to one author.
pub fn list(db: &Database, author_id: Option<u64>, order: SortOrder) -> Result<Vec<Chirp>, ApiError> {
    let mut chirps: Vec<Chirp> = db
        .list_chirps()?
        .into_iter()
        .filter(|c| author_id.is_none_or(|id| c.author_id == id))
        .collect();

    match order {
        SortOrder::Ascending => chirps.sort_by_key(|c| c.id),
        SortOrder::Descending => chirps.sort_by(|a, b| b.id.cmp(&a.id)),
    }
    Ok(chirps)
}

pub fn get(db: &Database, id: u64) -> Result<Chirp, ApiError> {
    Ok(db.get_chirp(id)?)
}

fn parse_id(raw: &str, what: &str) -> Result<u64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid {what}")))
}

// -- Handlers --

pub async fn create_chirp(
    State(state): State<AppState>,
    AuthUser(author_id): AuthUser,
    Json(req): Json<CreateChirpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp = run_blocking(move || submit(&state.db, author_id, &req.body)).await?;
    Ok((StatusCode::CREATED, Json(ChirpResponse::from(chirp))))
}

pub async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ChirpListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let author_id = match query.author_id.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_id(raw, "author ID")?),
        None => None,
    };
    let order = SortOrder::from_query(query.sort.as_deref());

    let chirps = run_blocking(move || list(&state.db, author_id, order)).await?;
    Ok(Json(
        chirps.into_iter().map(ChirpResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&chirp_id, "chirp ID")?;
    let chirp = run_blocking(move || get(&state.db, id)).await?;
    Ok(Json(ChirpResponse::from(chirp)))
}
