//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that only make sense
//! together (URLs, prefixes, non-zero limits). Every problem is reported, not
//! just the first.

use axum::http::HeaderName;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
        Ok(_) => errors.push(ValidationError::new(
            "upstream.base_url",
            "must be an absolute http or https URL",
        )),
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }

    check_prefix(&mut errors, "listener.route_prefix", &config.listener.route_prefix);
    check_prefix(
        &mut errors,
        "upstream.versioned_prefix",
        &config.upstream.versioned_prefix,
    );

    if HeaderName::from_bytes(config.upstream.secret_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "upstream.secret_header",
            "is not a valid header name",
        ));
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be greater than 0"));
    }
    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::new("upstream.max_body_bytes", "must be greater than 0"));
    }
    if config.rate_limit.requests == 0 {
        errors.push(ValidationError::new("rate_limit.requests", "must be greater than 0"));
    }
    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be greater than 0"));
    }
    if config.rate_limit.namespace.is_empty() {
        errors.push(ValidationError::new("rate_limit.namespace", "must not be empty"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    } else if config.timeouts.request_secs <= config.upstream.timeout_secs {
        // The outer timeout would fire first and answer 408 instead of 503.
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than upstream.timeout_secs",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_prefix(errors: &mut Vec<ValidationError>, field: &'static str, prefix: &str) {
    if !prefix.starts_with('/') {
        errors.push(ValidationError::new(field, "must start with '/'"));
    } else if prefix.len() > 1 && prefix.ends_with('/') {
        errors.push(ValidationError::new(field, "must not end with '/'"));
    }
}
