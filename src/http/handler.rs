//! Gateway request handler.
//!
//! # States
//! ```text
//! rate limit ──reject──▶ 429
//!     │ admit
//!     ▼
//! normalize path, validate ──invalid──▶ 400
//!     │ valid
//!     ▼
//! sanitize → forward → shape ──any failure──▶ 503
//!                        │
//!                        ▼
//!                      done (upstream status)
//! ```
//! Rate-limit headers are attached to every response produced after the
//! limiter ran.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, Uri},
    response::{IntoResponse, Response},
};

use crate::error::{GatewayError, GatewayResult};
use crate::http::request::X_REQUEST_ID;
use crate::http::response::ResponseShape;
use crate::http::upstream::UpstreamClient;
use crate::observability::metrics;
use crate::routing::{classify, validate_request, EndpointPath, QueryParams};
use crate::security::headers::{apply_rate_limit_headers, resolve_client_ip};
use crate::security::rate_limit::RateLimiter;
use crate::security::sanitize::sanitize_query;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub upstream: UpstreamClient,
}

/// Handles `GET {prefix}/{*path}`. `uri` has the gateway prefix stripped.
pub async fn gateway_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let path = uri.path();
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let client = resolve_client_ip(&headers);

    let verdict = state.limiter.check(&client);
    let (mut response, outcome) = if !verdict.allowed {
        tracing::warn!(request_id = %request_id, client = %client, path = %path, "Rate limit exceeded");
        metrics::record_rate_limited("fixed_window");

        let err = GatewayError::RateLimitExceeded { client };
        let outcome = err.outcome();
        let mut response = err.into_response();
        response.headers_mut().insert(
            RETRY_AFTER,
            HeaderValue::from(state.limiter.retry_after_secs()),
        );
        (response, outcome)
    } else {
        match forward(&state, path, uri.query(), &headers).await {
            Ok(response) => (response, "forwarded"),
            Err(err) => {
                match &err {
                    GatewayError::Upstream(cause) => {
                        tracing::error!(request_id = %request_id, path = %path, error = %cause, "Upstream request failed")
                    }
                    other => {
                        tracing::debug!(request_id = %request_id, path = %path, error = %other, "Request rejected")
                    }
                }
                let outcome = err.outcome();
                (err.into_response(), outcome)
            }
        }
    };

    apply_rate_limit_headers(
        response.headers_mut(),
        state.limiter.policy().requests,
        &verdict,
    );
    metrics::record_request(outcome, response.status().as_u16(), start_time);
    response
}

/// Validate, sanitize, forward and shape. Only called for admitted requests.
async fn forward(
    state: &AppState,
    path: &str,
    raw_query: Option<&str>,
    headers: &HeaderMap,
) -> GatewayResult<Response> {
    let endpoint = EndpointPath::parse(path)?;
    let params = QueryParams::parse(raw_query);
    validate_request(endpoint.as_str(), &params)?;

    let query = sanitize_query(&params);
    let request = state.upstream.build_request(&endpoint, &query, headers)?;

    tracing::debug!(
        endpoint = %classify(endpoint.as_str()),
        upstream = %request.url.path(),
        params = query.len(),
        "Forwarding request"
    );

    let upstream_start = Instant::now();
    let result = state.upstream.send(request).await;
    metrics::record_upstream(if result.is_ok() { "ok" } else { "error" }, upstream_start);
    let upstream = result?;

    let shape = ResponseShape::from_content_type(upstream.content_type.as_deref());
    tracing::debug!(status = %upstream.status, shape = shape.as_str(), "Upstream responded");

    Ok(shape.render(upstream, endpoint.as_str())?)
}
