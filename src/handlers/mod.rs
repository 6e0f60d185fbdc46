//! API handlers for xspace-auth

pub mod auth;
pub mod health;

pub use auth::*;
pub use health::health_check;

// Re-export AuthenticatedWallet from middleware for handler use
pub use crate::middleware::auth::AuthenticatedWallet;
