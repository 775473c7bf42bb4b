//! HTTP error types for the Ignite API.
//!
//! Every variant renders as an [`ErrorResponse`] body carrying the status
//! code and a client-safe message. Collaborator error details are logged by
//! the handlers and never reach the body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::ErrorResponse;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or token invalid.
    Unauthorized(String),
    /// Requested record not found.
    NotFound(String),
    /// Collaborator failure.
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Unauthorized(msg) | Self::NotFound(msg) | Self::Internal(msg) => msg,
        };
        let body = ErrorResponse {
            status_code: status.as_u16(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
