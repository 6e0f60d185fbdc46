//! Authentication middleware
//!
//! Extractors for access-token verification and wallet extraction.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::sync::Arc;

use crate::auth::{AuthError, TokenService};
use crate::error::ApiError;
use crate::models::TokenQuery;

/// Wallet extracted from a verified access token
#[derive(Debug, Clone)]
pub struct AuthenticatedWallet {
    pub address: String,
    pub chain_id: u64,
    pub is_registered: bool,
}

/// Raw `Authorization` header value
///
/// `Ok(None)` when the header is absent or empty. A header that is present
/// but not visible ASCII is rejected outright rather than treated as absent.
pub fn authorization_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    match headers.get(AUTHORIZATION) {
        None => Ok(None),
        Some(value) => {
            let value = value.to_str().map_err(|_| AuthError::MissingToken)?;
            Ok(Some(value).filter(|v| !v.is_empty()))
        }
    }
}

/// Extractor for authenticated wallets
///
/// Reads the bearer token from the Authorization header, falling back to a
/// `?token=` query parameter only when the header is absent, and verifies it
/// as an access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(wallet: AuthenticatedWallet) -> impl IntoResponse {
///     format!("Hello, {}", wallet.address)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedWallet
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = match authorization_header(&parts.headers)? {
            Some(header) => header.to_string(),
            None => {
                let query = Query::<TokenQuery>::from_request_parts(parts, state)
                    .await
                    .map(|Query(query)| query)
                    .unwrap_or_default();
                let token = query.token.ok_or(AuthError::MissingToken)?;
                format!("Bearer {}", token)
            }
        };

        let token_service = Arc::<TokenService>::from_ref(state);
        let identity = token_service.verify_access_token(&header)?;

        Ok(AuthenticatedWallet {
            address: identity.address,
            chain_id: identity.chain_id,
            is_registered: identity.is_registered,
        })
    }
}
