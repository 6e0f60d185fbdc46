//! Route definitions for xspace-auth API

mod auth;

use axum::{routing::get, Router};

use crate::handlers::health_check;
use crate::middleware;
use crate::state::AppState;

pub use auth::auth_routes;

/// Assemble the full application router with request tracing applied
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
