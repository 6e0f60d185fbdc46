//! Login verification
//!
//! Core business logic for wallet-based authentication: a signed challenge
//! goes in, an access/refresh token pair comes out.

use std::sync::Arc;

use serde::Deserialize;
use siwe::Message;

use super::crypto::recover_address;
use super::error::AuthError;
use super::jwt::{TokenPair, TokenService};
use super::nonce::NonceStore;

/// Signed challenge submitted by a wallet
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Challenge text exactly as the wallet signed it
    pub message: String,
    /// 65-byte `r || s || v` signature, hex encoded
    pub signature: String,
}

/// Verifies signed challenges and issues session tokens
pub struct LoginVerifier {
    nonces: Arc<NonceStore>,
    tokens: Arc<TokenService>,
}

impl LoginVerifier {
    pub fn new(nonces: Arc<NonceStore>, tokens: Arc<TokenService>) -> Self {
        Self { nonces, tokens }
    }

    /// Verify a signed challenge and issue tokens
    ///
    /// The embedded nonce is consumed once parsing succeeds, whatever the
    /// outcome of the signature check, so a request can never be replayed.
    ///
    /// # Returns
    /// * `Ok(TokenPair)` for the address named in the message
    /// * `Err(AuthError)` - `MalformedMessage`, `InvalidNonce`,
    ///   `SignatureMismatch`, or any token issuance failure
    pub fn login(&self, request: &LoginRequest) -> Result<TokenPair, AuthError> {
        let message = normalize_message(&request.message)
            .parse::<Message>()
            .map_err(|e| AuthError::MalformedMessage(e.to_string()))?;
        let address = siwe::eip55(&message.address);

        if !self.nonces.verify(&message.nonce) {
            tracing::debug!(address = %address, "Login with unknown, expired or used nonce");
            return Err(AuthError::InvalidNonce);
        }

        // The wallet signed the raw text, not the normalized form
        let signer = recover_address(&request.message, &request.signature).map_err(|e| {
            tracing::debug!(error = %e, "Signature recovery failed");
            AuthError::SignatureMismatch
        })?;

        if !signer.eq_ignore_ascii_case(&address) {
            tracing::debug!(
                claimed = %address,
                recovered = %signer,
                "Signature does not match claimed address"
            );
            return Err(AuthError::SignatureMismatch);
        }

        let access_token = self
            .tokens
            .issue_access_token(&address, message.chain_id)?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(&address, message.chain_id)?;

        tracing::info!(address = %address, chain_id = message.chain_id, "Wallet logged in");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

/// Undo framing some wallets add around the signed text
fn normalize_message(raw: &str) -> &str {
    let message = raw.strip_prefix('\n').unwrap_or(raw);
    let message = message
        .strip_prefix("https://")
        .or_else(|| message.strip_prefix("http://"))
        .unwrap_or(message);
    message.strip_suffix("\n ").unwrap_or(message)
}
