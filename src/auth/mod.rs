//! Authentication module for xspace
//!
//! Provides wallet-based authentication using Ethereum addresses.
//! - Single-use nonces with generational expiry
//! - Sign-In with Ethereum challenge messages
//! - Signature recovery and address matching
//! - JWT access and refresh tokens

mod challenge;
mod clock;
mod crypto;
mod error;
mod jwt;
mod nonce;
mod service;

pub use challenge::{ChallengeBuilder, LOGIN_STATEMENT};
pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::{
    keccak256, parse_address, personal_message_hash, personal_sign, public_key_to_address,
    recover_address, CryptoError,
};
pub use error::AuthError;
pub use jwt::{
    Claims, TokenPair, TokenService, TokenType, VerifiedIdentity, ACCESS_TOKEN_TTL_SECONDS,
    MAX_TOKEN_TTL_SECONDS, REFRESH_TOKEN_TTL_SECONDS,
};
pub use nonce::{NonceStore, DEFAULT_EXPIRE_SECONDS, DEFAULT_ROTATE_SECONDS};
pub use service::{LoginRequest, LoginVerifier};
