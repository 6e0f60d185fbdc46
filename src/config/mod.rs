//! Configuration management for xspace-auth
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use thiserror::Error;

use crate::auth::{
    ACCESS_TOKEN_TTL_SECONDS, DEFAULT_EXPIRE_SECONDS, DEFAULT_ROTATE_SECONDS,
    MAX_TOKEN_TTL_SECONDS, REFRESH_TOKEN_TTL_SECONDS,
};

/// Signing secret used outside production when `JWT_KEY` is missing or not hex
const DEVELOPMENT_JWT_SECRET: &[u8] = b"xspace-development-secret";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Settings consumed by the auth core
#[derive(Clone)]
pub struct AuthConfig {
    /// Issuer and audience of every token
    pub domain: String,

    /// Decoded HMAC secret
    pub jwt_secret: Vec<u8>,

    /// Seconds a fresh nonce stays valid
    pub nonce_expire_seconds: i64,

    /// Seconds between nonce generation rotations
    pub nonce_rotate_seconds: i64,

    pub access_token_ttl_seconds: i64,

    pub refresh_token_ttl_seconds: i64,
}

// Keeps the secret out of logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("domain", &self.domain)
            .field("jwt_secret", &"****")
            .field("nonce_expire_seconds", &self.nonce_expire_seconds)
            .field("nonce_rotate_seconds", &self.nonce_rotate_seconds)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .finish()
    }
}

impl AuthConfig {
    /// Defaults for `domain`, used by tests and local tooling
    pub fn for_domain(domain: impl Into<String>, jwt_secret: &[u8]) -> Self {
        Self {
            domain: domain.into(),
            jwt_secret: jwt_secret.to_vec(),
            nonce_expire_seconds: DEFAULT_EXPIRE_SECONDS,
            nonce_rotate_seconds: DEFAULT_ROTATE_SECONDS,
            access_token_ttl_seconds: ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: REFRESH_TOKEN_TTL_SECONDS,
        }
    }
}

impl AuthConfig {
    /// Every lifetime must be positive and at most `MAX_TOKEN_TTL_SECONDS`
    pub fn validate_lifetimes(&self) -> Result<(), ConfigError> {
        let lifetimes = [
            ("NONCE_EXPIRE_SECONDS", self.nonce_expire_seconds),
            ("NONCE_ROTATE_SECONDS", self.nonce_rotate_seconds),
            ("ACCESS_TOKEN_TTL_SECONDS", self.access_token_ttl_seconds),
            ("REFRESH_TOKEN_TTL_SECONDS", self.refresh_token_ttl_seconds),
        ];

        for (name, seconds) in lifetimes {
            if seconds <= 0 || seconds > MAX_TOKEN_TTL_SECONDS {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be between 1 and {} seconds, got {}",
                    name, MAX_TOKEN_TTL_SECONDS, seconds
                )));
            }
        }

        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Chain id used for challenges that don't name one
    pub default_chain_id: u64,

    pub auth: AuthConfig,

    /// Why the development signing secret is in use, if it is
    pub jwt_fallback_reason: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let default_chain_id = parse_or("DEFAULT_CHAIN_ID", 985u64)?;

        let domain = env::var("AUTH_DOMAIN").unwrap_or_else(|_| "xspace.com".to_string());
        let (jwt_secret, jwt_fallback_reason) =
            decode_jwt_secret(env::var("JWT_KEY").ok().as_deref(), &environment)?;

        let auth = AuthConfig {
            domain,
            jwt_secret,
            nonce_expire_seconds: parse_or("NONCE_EXPIRE_SECONDS", DEFAULT_EXPIRE_SECONDS)?,
            nonce_rotate_seconds: parse_or("NONCE_ROTATE_SECONDS", DEFAULT_ROTATE_SECONDS)?,
            access_token_ttl_seconds: parse_or(
                "ACCESS_TOKEN_TTL_SECONDS",
                ACCESS_TOKEN_TTL_SECONDS,
            )?,
            refresh_token_ttl_seconds: parse_or(
                "REFRESH_TOKEN_TTL_SECONDS",
                REFRESH_TOKEN_TTL_SECONDS,
            )?,
        };

        auth.validate_lifetimes()?;

        Ok(Config {
            environment,
            port,
            cors_allowed_origins,
            log_level,
            default_chain_id,
            auth,
            jwt_fallback_reason,
        })
    }
}

/// Decode the hex `JWT_KEY`.
///
/// Production refuses to start without a valid key. Elsewhere a missing or
/// malformed key falls back to a fixed development secret and the reason is
/// returned so it can be logged once tracing is up.
fn decode_jwt_secret(
    raw: Option<&str>,
    environment: &Environment,
) -> Result<(Vec<u8>, Option<String>), ConfigError> {
    let decoded = match raw {
        Some(value) => hex::decode(value.trim())
            .map_err(|e| format!("JWT_KEY is not valid hex: {}", e))
            .and_then(|key| {
                if key.is_empty() {
                    Err("JWT_KEY is empty".to_string())
                } else {
                    Ok(key)
                }
            }),
        None => Err("JWT_KEY is not set".to_string()),
    };

    match decoded {
        Ok(key) => Ok((key, None)),
        Err(reason) if environment.is_production() => Err(ConfigError::InvalidValue(reason)),
        Err(reason) => Ok((DEVELOPMENT_JWT_SECRET.to_vec(), Some(reason))),
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(format!("{} has an invalid value", name))),
        Err(_) => Ok(default),
    }
}
