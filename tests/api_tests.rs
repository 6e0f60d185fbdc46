//! HTTP API tests
//!
//! Exercise the router end to end with `tower::ServiceExt::oneshot`, no
//! listening socket required.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderValue, Request, StatusCode},
    Router,
};
use k256::ecdsa::SigningKey;
use serde_json::{json, Value};
use tower::ServiceExt;

use xspace_auth::auth::{personal_sign, public_key_to_address, ManualClock};
use xspace_auth::config::AuthConfig;
use xspace_auth::routes::create_router;
use xspace_auth::state::AppState;

const ORIGIN: &str = "https://app.xspace.com";

fn app() -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let config = AuthConfig::for_domain("xspace.com", b"api-test-secret");
    let state = AppState::with_clock(&config, 985, clock.clone());
    (create_router(state), clock)
}

fn wallet() -> (SigningKey, String) {
    let key = SigningKey::from_slice(&[0x42u8; 32]).unwrap();
    let address = format!("0x{}", hex::encode(public_key_to_address(key.verifying_key())));
    (key, address)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

async fn challenge(app: &Router, address: &str) -> String {
    let request = Request::get(format!("/v1/challenge?address={}", address))
        .header(header::ORIGIN, ORIGIN)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    String::from_utf8(body).unwrap()
}

fn login_request(message: &str, signature: &str) -> Request<Body> {
    Request::post("/v1/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "message": message, "signature": signature }).to_string(),
        ))
        .unwrap()
}

async fn login(app: &Router) -> (String, String) {
    let (key, address) = wallet();
    let message = challenge(app, &address).await;
    let signature = personal_sign(&key, &message).unwrap();

    let (status, body) = send(app, login_request(&message, &signature)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}

fn bearer_get(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();
    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_challenge_is_bound_to_origin() {
    let (app, _) = app();
    let (_, address) = wallet();

    let message = challenge(&app, &address).await;

    assert!(message.starts_with("app.xspace.com wants you to sign in with your Ethereum account:\n"));
    assert!(message.contains("\nURI: https://app.xspace.com\n"));
    assert!(message.contains("\nChain ID: 985\n"));
}

#[tokio::test]
async fn test_challenge_honours_chain_id() {
    let (app, _) = app();
    let (_, address) = wallet();

    let request = Request::get(format!("/v1/challenge?address={}&chainid=1", address))
        .header(header::ORIGIN, ORIGIN)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("\nChain ID: 1\n"));
}

#[tokio::test]
async fn test_challenge_bad_requests() {
    let (app, _) = app();
    let (_, address) = wallet();

    // No origin
    let request = Request::get(format!("/v1/challenge?address={}", address))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.0, StatusCode::BAD_REQUEST);

    // Non-numeric chain id
    let request = Request::get(format!("/v1/challenge?address={}&chainid=abc", address))
        .header(header::ORIGIN, ORIGIN)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.0, StatusCode::BAD_REQUEST);

    // Not an address
    let request = Request::get("/v1/challenge?address=0x1234")
        .header(header::ORIGIN, ORIGIN)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"]["code"], "MALFORMED_MESSAGE");
}

#[tokio::test]
async fn test_login_and_identity() {
    let (app, _) = app();
    let (_, address) = wallet();
    let (access, _) = login(&app).await;

    let (status, body) = send(&app, bearer_get("/v1/identity", &access)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert!(body["address"]
        .as_str()
        .unwrap()
        .eq_ignore_ascii_case(&address));
    assert_eq!(body["chainid"], 985);
}

#[tokio::test]
async fn test_identity_query_token_fallback() {
    let (app, _) = app();
    let (access, _) = login(&app).await;

    let request = Request::get(format!("/v1/identity?token={}", access))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_unreadable_header_does_not_fall_back_to_query() {
    let (app, _) = app();
    let (access, _) = login(&app).await;

    let mut request = Request::get(format!("/v1/identity?token={}", access))
        .body(Body::empty())
        .unwrap();
    request.headers_mut().insert(
        header::AUTHORIZATION,
        HeaderValue::from_bytes(&[0xff]).unwrap(),
    );

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_identity_requires_token() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        Request::get("/v1/identity").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_login_replay_is_unauthorized() {
    let (app, _) = app();
    let (key, address) = wallet();
    let message = challenge(&app, &address).await;
    let signature = personal_sign(&key, &message).unwrap();

    assert_eq!(
        send(&app, login_request(&message, &signature)).await.0,
        StatusCode::OK
    );

    let (status, body) = send(&app, login_request(&message, &signature)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "INVALID_NONCE");
}

#[tokio::test]
async fn test_login_bad_signature_is_unauthorized() {
    let (app, _) = app();
    let (_, address) = wallet();
    let message = challenge(&app, &address).await;
    let impostor = SigningKey::from_slice(&[0x43u8; 32]).unwrap();
    let signature = personal_sign(&impostor, &message).unwrap();

    let (status, body) = send(&app, login_request(&message, &signature)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "SIGNATURE_MISMATCH");
}

#[tokio::test]
async fn test_login_malformed_input() {
    let (app, _) = app();

    let (status, body) = send(&app, login_request("not a challenge", "0x00")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"]["code"], "MALFORMED_MESSAGE");

    let request = Request::post("/v1/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{"))
        .unwrap();
    assert_eq!(send(&app, request).await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_after_nonce_expiry() {
    let (app, clock) = app();
    let (key, address) = wallet();
    let message = challenge(&app, &address).await;
    let signature = personal_sign(&key, &message).unwrap();

    clock.advance(91);

    let (status, body) = send(&app, login_request(&message, &signature)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "INVALID_NONCE");
}

#[tokio::test]
async fn test_refresh_flow() {
    let (app, _) = app();
    let (access, refresh) = login(&app).await;

    let (status, body) = send(&app, bearer_get("/v1/refresh", &refresh)).await;
    assert_eq!(status, StatusCode::OK);
    let new_access = json_body(&body)["accessToken"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(
        send(&app, bearer_get("/v1/identity", &new_access)).await.0,
        StatusCode::OK
    );

    // Token kinds are not interchangeable
    let (status, body) = send(&app, bearer_get("/v1/refresh", &access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "INVALID_TOKEN_TYPE");

    let (status, body) = send(&app, bearer_get("/v1/identity", &refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "INVALID_TOKEN_TYPE");
}

#[tokio::test]
async fn test_expired_access_token() {
    let (app, clock) = app();
    let (access, _) = login(&app).await;

    clock.advance(2 * 60 * 60);

    let (status, body) = send(&app, bearer_get("/v1/identity", &access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_refresh_without_header() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        Request::get("/v1/refresh").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"]["code"], "MISSING_TOKEN");
}
