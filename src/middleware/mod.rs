//! Middleware for xspace-auth API
//!
//! This module provides middleware for request tracing and authentication.

pub mod auth;
mod tracing;

pub use auth::{authorization_header, AuthenticatedWallet};
pub use tracing::request_tracing;
