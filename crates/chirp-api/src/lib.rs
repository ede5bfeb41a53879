//! Chirpy's service layer and HTTP surface.
//!
//! The service functions (`chirps::submit`, `users::signup`, `auth::login`,
//! `webhooks::handle`, ...) are synchronous and talk to the record store
//! directly. The axum handlers next to them move that work onto the
//! blocking pool and translate errors into responses.

pub mod auth;
pub mod chirps;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod password;
pub mod profanity;
pub mod routes;
pub mod state;
pub mod token;
pub mod users;
pub mod webhooks;

pub use error::{ApiError, AuthError, ErrorKind};
pub use routes::router;
pub use state::{AppState, AppStateInner};
