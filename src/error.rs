//! Error types for the quota server.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

use crate::models::ErrorBody;

/// Body sent with every rate limit denial.
pub const DENIED_MESSAGE: &str = "denied!";

/// Main error type for quota server operations.
#[derive(Error, Debug)]
pub enum QuotaError {
    /// The shared quota is exhausted for the current window.
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded {
        status: StatusCode,
        retry_after: Duration,
    },

    /// Invalid command line or startup settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure encoding the metrics registry
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for quota server operations.
pub type Result<T> = std::result::Result<T, QuotaError>;

/// Why a single read by the queue reader failed.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The server answered with something other than 200.
    #[error("Wrong status code: {status}")]
    Status {
        status: u16,
        retry_after: Option<Duration>,
    },

    /// The request never got a response
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ReadError {
    /// Wait the server asked for, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ReadError::Status { retry_after, .. } => *retry_after,
            ReadError::Request(_) => None,
        }
    }
}

/// Round a wait up to whole seconds for the `Retry-After` header.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 { secs.saturating_add(1) } else { secs }
}

impl IntoResponse for QuotaError {
    fn into_response(self) -> Response {
        match self {
            QuotaError::RateLimitExceeded {
                status,
                retry_after,
            } => (
                status,
                [(header::RETRY_AFTER, retry_after_secs(retry_after).to_string())],
                Json(ErrorBody::new(DENIED_MESSAGE)),
            )
                .into_response(),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(other.to_string())),
            )
                .into_response(),
        }
    }
}
