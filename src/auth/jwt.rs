//! Session token issuance and verification
//!
//! Access and refresh tokens share one HS256 claim shape and differ only in
//! their `type` claim and lifetime. A refresh token never passes where an
//! access token is required and vice versa.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::error::AuthError;

/// Access token lifetime (2 hours)
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 2 * 60 * 60;

/// Refresh token lifetime (7 days)
pub const REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Longest lifetime configuration may give either token kind (1 year)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

const BEARER_PREFIX: &str = "Bearer ";

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Token type (access or refresh)
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Set once the account completed registration
    pub is_registered: bool,
    pub chain_id: u64,
    pub iss: String,
    pub aud: String,
    /// Subject (wallet address)
    pub sub: String,
    /// JWT ID, unique per token
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Pair handed out on successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Identity carried by a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub address: String,
    pub chain_id: u64,
    pub is_registered: bool,
}

/// Issues and verifies session tokens for one service domain
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    domain: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a token service
    ///
    /// # Arguments
    /// * `secret` - Shared HMAC secret, used to both sign and verify
    /// * `domain` - Required issuer and audience of every accepted token
    pub fn new(secret: &[u8], domain: impl Into<String>) -> Self {
        Self::with_clock(secret, domain, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &[u8], domain: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            domain: domain.into(),
            access_ttl_seconds: ACCESS_TOKEN_TTL_SECONDS,
            refresh_ttl_seconds: REFRESH_TOKEN_TTL_SECONDS,
            clock,
        }
    }

    /// Override the default token lifetimes
    pub fn with_ttls(mut self, access_ttl_seconds: i64, refresh_ttl_seconds: i64) -> Self {
        self.access_ttl_seconds = access_ttl_seconds;
        self.refresh_ttl_seconds = refresh_ttl_seconds;
        self
    }

    /// Issue an access token for a freshly authenticated, unregistered account
    pub fn issue_access_token(&self, address: &str, chain_id: u64) -> Result<String, AuthError> {
        self.issue(address, chain_id, TokenType::Access, false)
    }

    /// Issue an access token carrying an explicit registration flag
    pub fn issue_access_token_with_flag(
        &self,
        address: &str,
        chain_id: u64,
        is_registered: bool,
    ) -> Result<String, AuthError> {
        self.issue(address, chain_id, TokenType::Access, is_registered)
    }

    pub fn issue_refresh_token(&self, address: &str, chain_id: u64) -> Result<String, AuthError> {
        self.issue(address, chain_id, TokenType::Refresh, false)
    }

    /// Verify an `Authorization` header value carrying an access token
    ///
    /// # Returns
    /// * `Ok(identity)` with the token's subject and chain id
    /// * `Err(AuthError)` - `MissingToken`, `WrongTokenType` or `InvalidToken`
    pub fn verify_access_token(&self, bearer_header: &str) -> Result<VerifiedIdentity, AuthError> {
        let claims = self.verify(bearer_header, TokenType::Access)?;
        Ok(VerifiedIdentity {
            address: claims.sub,
            chain_id: claims.chain_id,
            is_registered: claims.is_registered,
        })
    }

    /// Verify a refresh token header and mint a new access token from it.
    ///
    /// The refresh token itself is not rotated and stays usable until expiry.
    pub fn verify_refresh_token(&self, bearer_header: &str) -> Result<String, AuthError> {
        let claims = self.verify(bearer_header, TokenType::Refresh)?;
        self.issue_access_token_with_flag(&claims.sub, claims.chain_id, claims.is_registered)
    }

    fn issue(
        &self,
        address: &str,
        chain_id: u64,
        token_type: TokenType,
        is_registered: bool,
    ) -> Result<String, AuthError> {
        let now = self.clock.unix();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl_seconds,
            TokenType::Refresh => self.refresh_ttl_seconds,
        };

        let claims = Claims {
            token_type,
            is_registered,
            chain_id,
            iss: self.domain.clone(),
            aud: self.domain.clone(),
            sub: address.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now
                .checked_add(ttl)
                .ok_or_else(|| AuthError::TokenIssuance("token lifetime overflows".to_string()))?,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssuance(e.to_string()))
    }

    fn verify(&self, bearer_header: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let token = bearer_header
            .strip_prefix(BEARER_PREFIX)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        // Cheap pre-filter on the unverified claims; acceptance below still
        // requires a valid signature and lifetime.
        let unverified = decode_unverified(token)?;
        if unverified.iss != self.domain || unverified.aud != self.domain {
            tracing::debug!(iss = %unverified.iss, aud = %unverified.aud, "Token issued for another domain");
            return Err(AuthError::InvalidToken);
        }
        if unverified.token_type != expected {
            tracing::debug!(
                expected = expected.as_str(),
                presented = unverified.token_type.as_str(),
                "Token type mismatch"
            );
            return Err(AuthError::WrongTokenType);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Lifetime is checked against the injected clock below
        validation.validate_exp = false;
        validation.set_issuer(&[&self.domain]);
        validation.set_audience(&[&self.domain]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token signature validation failed");
                AuthError::InvalidToken
            })?
            .claims;

        let now = self.clock.unix();
        if claims.exp <= now {
            tracing::debug!(exp = claims.exp, now = now, "Token expired");
            return Err(AuthError::InvalidToken);
        }
        if claims.iat > now {
            tracing::debug!(iat = claims.iat, now = now, "Token used before issue time");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}

/// Read the claims segment without checking the signature
fn decode_unverified(token: &str) -> Result<Claims, AuthError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::InvalidToken);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}
