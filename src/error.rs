//! # error
//!
//! Centralised error types.
//!
//! * [`AppError`]: returned by HTTP handlers.  Axum's `IntoResponse` impl
//!   converts it into a structured JSON body so the alert source always gets a
//!   machine-readable response, even on failure.
//! * [`TransportError`]: returned by a chat transport.  Never leaves the
//!   delivery queue: it only decides whether to wait, retry, or give up.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// ─── AppError ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    /// The webhook payload could not be parsed or failed validation.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "ok":    false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

// ─── TransportError ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    /// Downstream asked us to slow down (HTTP 429).
    #[error("rate limited, retry after {}s", retry_after.as_secs())]
    Throttled { retry_after: Duration },

    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    /// Any non-2xx, non-429 answer.
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

// ─── Tests ────────────────────────────────────────────────────────────────────
