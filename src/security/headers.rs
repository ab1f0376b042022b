//! Client identification and rate-limit response headers.
//!
//! Client IP precedence: CDN connecting-IP header, first `X-Forwarded-For`
//! entry, `X-Real-IP`, then the literal `unknown`.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::security::rate_limit::RateLimitVerdict;

pub const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Identify the caller for rate limiting.
pub fn resolve_client_ip(headers: &HeaderMap) -> String {
    header_str(headers, &CF_CONNECTING_IP)
        .or_else(|| {
            header_str(headers, &X_FORWARDED_FOR)
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .or_else(|| header_str(headers, &X_REAL_IP))
        .unwrap_or("unknown")
        .to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Attach `X-RateLimit-{Limit,Remaining,Reset}`.
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, limit: u32, verdict: &RateLimitVerdict) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(verdict.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(verdict.reset_at_ms));
}

/// The inbound `Authorization` header, if it carries a bearer token.
pub fn forwardable_bearer(headers: &HeaderMap) -> Option<HeaderValue> {
    headers
        .get(header::AUTHORIZATION)
        .filter(|v| v.as_bytes().starts_with(b"Bearer "))
        .cloned()
}
