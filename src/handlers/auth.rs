//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based authentication.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header::ORIGIN, HeaderMap},
    Json,
};
use url::Url;

use super::AuthenticatedWallet;
use crate::error::ApiError;
use crate::middleware::authorization_header;
use crate::models::{
    ChallengeQuery, IdentityResponse, LoginRequest, LoginResponse, RefreshResponse,
};
use crate::state::AppState;

/// GET /v1/challenge - Build a login challenge for the requesting origin
///
/// The challenge is bound to the `Origin` header: its host becomes the
/// message domain and the full origin its URI.
pub async fn get_challenge(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ChallengeQuery>, QueryRejection>,
) -> Result<String, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Origin header required".to_string()))?;
    let domain = origin_authority(origin)?;
    let chain_id = query.chainid.unwrap_or(state.default_chain_id);

    let message = state
        .challenge_builder
        .build(&domain, &query.address, origin, chain_id)?;

    Ok(message)
}

/// POST /v1/login - Verify a signed challenge and issue tokens
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let tokens = state.login_verifier.login(&req)?;

    Ok(Json(tokens))
}

/// GET /v1/refresh - Mint a new access token from a refresh token
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, ApiError> {
    let header = authorization_header(&headers)?.unwrap_or_default();

    let access_token = state.token_service.verify_refresh_token(header)?;

    Ok(Json(RefreshResponse { access_token }))
}

/// GET /v1/identity - Report the wallet behind the access token
pub async fn identity(wallet: AuthenticatedWallet) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        address: wallet.address,
        chainid: wallet.chain_id,
    })
}

/// Host, plus port when present, of an origin such as `https://app.xspace.com`
fn origin_authority(origin: &str) -> Result<String, ApiError> {
    let url = Url::parse(origin)
        .map_err(|e| ApiError::BadRequest(format!("Invalid Origin header: {}", e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| ApiError::BadRequest("Origin header has no host".to_string()))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
