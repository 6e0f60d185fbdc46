//! Login challenge construction
//!
//! Challenges are Sign-In with Ethereum (EIP-4361) messages. The server never
//! stores their fields; login re-reads them from the signed text.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use chrono::SecondsFormat;
use siwe::{Message, Version};

use super::clock::{Clock, SystemClock};
use super::crypto::parse_address;
use super::error::AuthError;
use super::nonce::NonceStore;

/// Statement embedded in every challenge. Signatures over it are only ever
/// accepted by the login flow.
pub const LOGIN_STATEMENT: &str = "The message is only used for login";

/// Builds the text a wallet signs to log in
pub struct ChallengeBuilder {
    nonces: Arc<NonceStore>,
    clock: Arc<dyn Clock>,
}

impl ChallengeBuilder {
    pub fn new(nonces: Arc<NonceStore>) -> Self {
        Self::with_clock(nonces, Arc::new(SystemClock))
    }

    pub fn with_clock(nonces: Arc<NonceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { nonces, clock }
    }

    /// Build a challenge bound to a freshly issued nonce
    ///
    /// Inputs are validated before a nonce is drawn, so rejected requests
    /// never take up nonce space.
    ///
    /// # Arguments
    /// * `domain` - Authority of the requesting origin, e.g. `app.xspace.com`
    /// * `address` - Account expected to sign, `0x` + 40 hex digits
    /// * `uri` - Origin URI the user is signing in to
    /// * `chain_id` - Chain the wallet is connected to
    pub fn build(
        &self,
        domain: &str,
        address: &str,
        uri: &str,
        chain_id: u64,
    ) -> Result<String, AuthError> {
        let domain_field = parse_field(domain, "domain")?;
        let address_field =
            parse_address(address).map_err(|e| AuthError::MalformedMessage(e.to_string()))?;
        let uri_field = parse_field(uri, "URI")?;
        let issued_at = parse_field(
            &self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "issued-at time",
        )?;

        let nonce = self.nonces.generate()?;

        let message = Message {
            domain: domain_field,
            address: address_field,
            statement: Some(LOGIN_STATEMENT.to_string()),
            uri: uri_field,
            version: Version::V1,
            chain_id,
            nonce,
            issued_at,
            expiration_time: None,
            not_before: None,
            request_id: None,
            resources: Vec::new(),
        };

        tracing::debug!(domain = %domain, chain_id = chain_id, "Issued login challenge");

        Ok(message.to_string())
    }
}

fn parse_field<T>(value: &str, what: &str) -> Result<T, AuthError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| AuthError::MalformedMessage(format!("invalid {} {:?}: {}", what, value, e)))
}
