//! xspace-auth Library
//!
//! Wallet sign-in for xspace: single-use nonces, Sign-In with Ethereum
//! challenges, signature-verified login and JWT session tokens, plus the
//! HTTP surface that exposes them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
