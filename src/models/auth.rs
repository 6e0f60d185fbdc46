//! Authentication models for xspace-auth

use serde::{Deserialize, Serialize};

pub use crate::auth::{LoginRequest, TokenPair as LoginResponse};

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Query string of `GET /v1/challenge`
#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    pub address: String,
    /// Falls back to the configured default chain when absent
    pub chainid: Option<u64>,
}

/// Query string accepted by authenticated endpoints, for clients that
/// cannot set headers (e.g. websocket upgrades)
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Fresh access token minted from a refresh token
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Identity behind the presented access token
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub address: String,
    pub chainid: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let refresh = serde_json::to_value(RefreshResponse {
            access_token: "a".to_string(),
        })
        .unwrap();
        assert_eq!(refresh["accessToken"], "a");

        let login = serde_json::to_value(LoginResponse {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        })
        .unwrap();
        assert_eq!(login["accessToken"], "a");
        assert_eq!(login["refreshToken"], "r");

        let identity = serde_json::to_value(IdentityResponse {
            address: "0xabc".to_string(),
            chainid: 985,
        })
        .unwrap();
        assert_eq!(identity["chainid"], 985);
    }

    #[test]
    fn test_challenge_query_chain_is_optional() {
        let query: ChallengeQuery = serde_json::from_str(r#"{"address":"0xabc"}"#).unwrap();
        assert_eq!(query.chainid, None);
    }
}
