//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/challenge", get(auth::get_challenge))
        .route("/v1/login", post(auth::login))
        .route("/v1/refresh", get(auth::refresh))
        .route("/v1/identity", get(auth::identity))
}
