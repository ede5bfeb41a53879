use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use chirp_db::Database;

use crate::error::ApiError;
use crate::token::TokenService;

pub type AppState = Arc<AppStateInner>;

/// Everything a handler needs, passed explicitly through axum state.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub polka_key: String,
    /// Requests served under `/app` since start or the last admin reset.
    pub file_server_hits: AtomicU64,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: &str, polka_key: impl Into<String>) -> AppState {
        Arc::new(Self {
            db,
            tokens: TokenService::new(jwt_secret),
            polka_key: polka_key.into(),
            file_server_hits: AtomicU64::new(0),
        })
    }
}

/// Run store or hashing work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}")))?
}
