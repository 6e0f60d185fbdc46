//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{ChallengeBuilder, Clock, LoginVerifier, NonceStore, SystemClock, TokenService};
use crate::config::AuthConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub challenge_builder: Arc<ChallengeBuilder>,
    pub login_verifier: Arc<LoginVerifier>,
    pub token_service: Arc<TokenService>,
    /// Chain id used when a challenge request names none
    pub default_chain_id: u64,
}

impl AppState {
    pub fn new(
        challenge_builder: Arc<ChallengeBuilder>,
        login_verifier: Arc<LoginVerifier>,
        token_service: Arc<TokenService>,
        default_chain_id: u64,
    ) -> Self {
        Self {
            challenge_builder,
            login_verifier,
            token_service,
            default_chain_id,
        }
    }

    /// Wire the auth components from configuration on the system clock
    pub fn from_config(auth: &AuthConfig, default_chain_id: u64) -> Self {
        Self::with_clock(auth, default_chain_id, Arc::new(SystemClock))
    }

    /// Wire the auth components around a shared clock
    pub fn with_clock(auth: &AuthConfig, default_chain_id: u64, clock: Arc<dyn Clock>) -> Self {
        let nonce_store = Arc::new(NonceStore::with_clock(
            auth.nonce_expire_seconds,
            auth.nonce_rotate_seconds,
            clock.clone(),
        ));
        let token_service = Arc::new(
            TokenService::with_clock(&auth.jwt_secret, auth.domain.clone(), clock.clone())
                .with_ttls(auth.access_token_ttl_seconds, auth.refresh_token_ttl_seconds),
        );

        Self::new(
            Arc::new(ChallengeBuilder::with_clock(nonce_store.clone(), clock)),
            Arc::new(LoginVerifier::new(nonce_store, token_service.clone())),
            token_service,
            default_chain_id,
        )
    }
}

impl FromRef<AppState> for Arc<ChallengeBuilder> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.challenge_builder.clone()
    }
}

impl FromRef<AppState> for Arc<LoginVerifier> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.login_verifier.clone()
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_service.clone()
    }
}
