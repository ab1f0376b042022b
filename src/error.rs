//! Gateway error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::upstream::UpstreamError;
use crate::routing::RequestError;
use crate::security::sanitize::create_error_response;

/// Body of every 503.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Service temporarily unavailable";
/// Body of every 429.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Request-terminating errors. None are retried.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] RequestError),

    #[error("rate limit exceeded for client {client}")]
    RateLimitExceeded { client: String },

    #[error("upstream failure: {0}")]
    Upstream(#[from] UpstreamError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "invalid",
            GatewayError::RateLimitExceeded { .. } => "rate_limited",
            GatewayError::Upstream(_) => "upstream_error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            GatewayError::Validation(err) => create_error_response(&err.to_string(), status),
            GatewayError::RateLimitExceeded { .. } => {
                create_error_response(RATE_LIMIT_MESSAGE, status)
            }
            // Never leak upstream detail to the caller.
            GatewayError::Upstream(_) => create_error_response(UPSTREAM_FAILURE_MESSAGE, status),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
