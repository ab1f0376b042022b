//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rewrite the endpoint path onto the backend's versioned prefix
//! - Build the allow-listed outbound header set
//! - Issue a single GET bounded by the client timeout
//! - Buffer the body up to a size cap
//!
//! Timeouts and transport failures are both `UpstreamError`; the handler does
//! not distinguish them when responding.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
    HeaderMap, HeaderName, HeaderValue, StatusCode,
};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::http::request::X_REQUEST_ID;
use crate::routing::EndpointPath;
use crate::security::headers::forwardable_bearer;
use crate::security::sanitize::SanitizedQuery;

/// User-Agent sent on every upstream call.
pub const GATEWAY_USER_AGENT: &str = concat!("proxygrid-gateway/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid upstream configuration: {0}")]
    Config(String),

    #[error("undecodable upstream body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("upstream body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Transport(err)
        }
    }
}

/// A fully built outbound call. Method is always GET.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: Url,
    pub headers: HeaderMap,
}

/// What came back, body fully buffered.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// HTTP client for the aggregation backend.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: Url,
    versioned_prefix: String,
    shared_secret: Option<(HeaderName, HeaderValue)>,
    max_body_bytes: usize,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(&config.base_url)?;

        let shared_secret = match &config.shared_secret {
            Some(secret) => {
                let name = HeaderName::from_bytes(config.secret_header.as_bytes())
                    .map_err(|e| UpstreamError::Config(e.to_string()))?;
                let mut value =
                    HeaderValue::from_str(secret).map_err(|e| UpstreamError::Config(e.to_string()))?;
                value.set_sensitive(true);
                Some((name, value))
            }
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .no_proxy()
            .build()
            .map_err(UpstreamError::Transport)?;

        Ok(Self {
            client,
            base_url,
            versioned_prefix: config.versioned_prefix.clone(),
            shared_secret,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Build the outbound request for a normalized endpoint path and its
    /// sanitized query.
    pub fn build_request(
        &self,
        endpoint: &EndpointPath,
        query: &SanitizedQuery,
        inbound: &HeaderMap,
    ) -> Result<UpstreamRequest, UpstreamError> {
        let mut url = self.base_url.clone();
        url.set_path(&format!(
            "{}{}",
            self.base_url.path().trim_end_matches('/'),
            self.versioned_prefix,
        ));
        url.set_fragment(None);
        // Each segment is encoded on its own and cannot leave the prefix.
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Config("upstream base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(endpoint.segments());
        if query.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(query.iter());
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(GATEWAY_USER_AGENT));
        if let Some(bearer) = forwardable_bearer(inbound) {
            headers.insert(AUTHORIZATION, bearer);
        }
        if let Some((name, value)) = &self.shared_secret {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(id) = inbound.get(X_REQUEST_ID) {
            headers.insert(X_REQUEST_ID, id.clone());
        }

        Ok(UpstreamRequest { url, headers })
    }

    /// Single attempt, no retries. The body is buffered up to the configured
    /// cap.
    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let mut response = self
            .client
            .get(request.url)
            .headers(request.headers)
            .send()
            .await?;

        let limit = self.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(UpstreamError::BodyTooLarge { limit });
        }

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(UpstreamError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(UpstreamResponse {
            status,
            content_type,
            body: Bytes::from(body),
        })
    }
}
