//! Response shaping.
//!
//! The upstream's declared content type picks one `ResponseShape`; each shape
//! owns its body conversion and cache policy. The upstream status code is
//! preserved in every shape.

use axum::{
    body::Body,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
        HeaderValue,
    },
    response::Response,
};

use crate::http::cache::{cache_control_for, directive};
use crate::http::upstream::{UpstreamError, UpstreamResponse};

/// One hour, for images regardless of path.
const BINARY_MAX_AGE: u32 = 3_600;
/// One day, for markdown regardless of path.
const MARKDOWN_MAX_AGE: u32 = 86_400;

const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

/// How an upstream payload is re-emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `image/*`, passed through untouched.
    Binary,
    /// `text/markdown`, passed through as text.
    Markdown,
    /// Everything else, parsed and re-emitted as JSON.
    Structured,
}

impl ResponseShape {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let content_type = content_type.unwrap_or_default().trim().to_ascii_lowercase();
        if content_type.starts_with("image/") {
            ResponseShape::Binary
        } else if content_type.starts_with("text/markdown") {
            ResponseShape::Markdown
        } else {
            ResponseShape::Structured
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseShape::Binary => "binary",
            ResponseShape::Markdown => "markdown",
            ResponseShape::Structured => "structured",
        }
    }

    /// Build the outbound response for `endpoint_path`.
    ///
    /// Fails only when a structured body is not valid JSON.
    pub fn render(
        self,
        upstream: UpstreamResponse,
        endpoint_path: &str,
    ) -> Result<Response, UpstreamError> {
        let UpstreamResponse {
            status,
            content_type,
            body,
        } = upstream;

        let mut response = match self {
            ResponseShape::Binary => {
                let mut response = Response::new(Body::from(body));
                let content_type = content_type
                    .as_deref()
                    .and_then(|ct| HeaderValue::from_str(ct).ok())
                    .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
                response.headers_mut().insert(CONTENT_TYPE, content_type);
                insert_cache_control(&mut response, directive(BINARY_MAX_AGE, None));
                response
            }
            ResponseShape::Markdown => {
                let text = String::from_utf8_lossy(&body).into_owned();
                let mut response = Response::new(Body::from(text));
                let headers = response.headers_mut();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(MARKDOWN_CONTENT_TYPE));
                headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
                insert_cache_control(&mut response, directive(MARKDOWN_MAX_AGE, None));
                response
            }
            ResponseShape::Structured => {
                let value: serde_json::Value = serde_json::from_slice(&body)?;
                let mut response = Response::new(Body::from(serde_json::to_vec(&value)?));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                insert_cache_control(&mut response, cache_control_for(endpoint_path));
                response
            }
        };

        *response.status_mut() = status;
        Ok(response)
    }
}

fn insert_cache_control(response: &mut Response, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }
}
