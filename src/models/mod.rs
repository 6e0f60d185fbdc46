//! Request and response models for the xspace-auth API

pub mod auth;
pub use auth::*;

use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
