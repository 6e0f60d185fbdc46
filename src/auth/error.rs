//! Authentication error kinds
//!
//! The set is deliberately small: callers map each kind to a single HTTP
//! status and never see the finer-grained cause, which is only logged.

use thiserror::Error;

/// Errors returned by the nonce, challenge, login and token components
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token is null, not found in `Authorization: Bearer ` header")]
    MissingToken,

    #[error("Malformed challenge message: {0}")]
    MalformedMessage(String),

    /// Unknown, expired and already consumed nonces all land here
    #[error("Invalid nonce")]
    InvalidNonce,

    #[error("Signature does not match address")]
    SignatureMismatch,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token type")]
    WrongTokenType,

    #[error("Randomness source failure")]
    RandomnessFailure,

    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),
}

impl AuthError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::MalformedMessage(_) => "MALFORMED_MESSAGE",
            AuthError::InvalidNonce => "INVALID_NONCE",
            AuthError::SignatureMismatch => "SIGNATURE_MISMATCH",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::WrongTokenType => "INVALID_TOKEN_TYPE",
            AuthError::RandomnessFailure => "RANDOMNESS_FAILURE",
            AuthError::TokenIssuance(_) => "TOKEN_ISSUANCE_FAILED",
        }
    }
}
