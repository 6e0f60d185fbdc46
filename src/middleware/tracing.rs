//! Request tracing middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Middleware for logging request information with timing
///
/// Every request runs inside a span carrying a generated request id, so the
/// auth components' own log lines can be correlated with it. Query strings
/// are never logged since they may carry tokens.
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = Uuid::new_v4();

    // Extract client IP if available
    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        });

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let start = Instant::now();

        tracing::info!(client_ip = ?client_ip, "Request started");

        let response = next.run(request).await;

        let duration = start.elapsed();
        let status = response.status();

        if status.is_server_error() {
            tracing::error!(
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "Request completed with error"
            );
        } else if status.is_client_error() {
            tracing::warn!(
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "Request completed with client error"
            );
        } else {
            tracing::info!(
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "Request completed"
            );
        }

        response
    }
    .instrument(span)
    .await
}
