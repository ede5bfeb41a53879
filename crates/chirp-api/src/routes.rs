use std::path::Path;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};
use crate::{auth, chirps, metrics, users, webhooks};

/// Options for the parts of the router that vary between deployments.
#[derive(Debug, Clone)]
pub struct RouterOptions<'a> {
    /// Directory served under `/app`.
    pub static_dir: &'a Path,
    /// Mount `POST /api/reset`, which wipes the database.
    pub debug: bool,
}

pub fn router(state: AppState, opts: RouterOptions<'_>) -> Router {
    let mut api = Router::new()
        .route("/healthz", get(healthz))
        .route("/users", post(users::create_user).put(users::update_user))
        .route("/login", post(auth::login_handler))
        .route("/chirps", post(chirps::create_chirp).get(chirps::list_chirps))
        .route("/chirps/{chirp_id}", get(chirps::get_chirp))
        .route("/polka/webhooks", post(webhooks::polka_webhook));
    if opts.debug {
        api = api.route("/reset", post(reset_database));
    }

    let admin = Router::new()
        .route("/metrics", get(metrics::admin_metrics))
        .route("/reset", post(metrics::reset_hits));

    let app = Router::new()
        .nest_service("/app", ServeDir::new(opts.static_dir))
        .layer(middleware::from_fn_with_state(state.clone(), metrics::count_hits));

    Router::new()
        .merge(app)
        .nest("/api", api)
        .nest("/admin", admin)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "OK"
}

async fn reset_database(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    run_blocking(move || Ok(state.db.reset()?)).await?;
    Ok(StatusCode::OK)
}
