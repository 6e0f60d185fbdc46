//! Centralized API error handling for xspace-auth
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Failure raised by the auth core
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Auth(err) => err.code(),
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(err) => match err {
                AuthError::MalformedMessage(_) => StatusCode::BAD_REQUEST,
                AuthError::MissingToken
                | AuthError::InvalidNonce
                | AuthError::SignatureMismatch
                | AuthError::InvalidToken
                | AuthError::WrongTokenType => StatusCode::UNAUTHORIZED,
                AuthError::RandomnessFailure | AuthError::TokenIssuance(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log server errors
        if status.is_server_error() {
            tracing::error!(error = %message, code = %error_code, "Server error occurred");
        } else {
            tracing::debug!(error = %message, code = %error_code, "Client error occurred");
        }

        // Internal detail stays in the log
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            message
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
