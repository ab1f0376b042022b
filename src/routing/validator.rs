//! Per-class parameter validation.
//!
//! Runs before any network I/O. A rejected request never reaches the
//! upstream.

use crate::routing::endpoint::{match_rule, segments, EndpointClass, EndpointRule};
use crate::routing::params::QueryParams;
use crate::security::sanitize::{
    sanitize_url, validate_domain, validate_search_query, validate_youtube_id, SearchQueryError,
};

/// Suffix selecting the metadata view of a video.
const VIDEO_INFO_SUFFIX: &str = "info";

/// Why a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Query parameter is required")]
    MissingQuery,
    #[error("{0}")]
    InvalidQuery(SearchQueryError),
    #[error("URL parameter is required")]
    MissingUrl,
    #[error("Invalid URL format")]
    InvalidUrl,
    #[error("Invalid domain format")]
    InvalidDomain,
    #[error("Invalid YouTube video ID")]
    InvalidVideoId,
    #[error("Invalid request path")]
    InvalidPath,
}

/// Validate `path` (gateway prefix already removed, normalized by
/// [`EndpointPath`](crate::routing::EndpointPath)) and its query.
pub fn validate_request(path: &str, params: &QueryParams) -> Result<(), RequestError> {
    let Some(rule) = match_rule(path) else {
        return Ok(());
    };

    match rule.class {
        EndpointClass::Search => {
            let q = params.non_empty("q").ok_or(RequestError::MissingQuery)?;
            validate_search_query(q).map_err(RequestError::InvalidQuery)
        }
        EndpointClass::UrlParameter => {
            let url = params.non_empty("url").ok_or(RequestError::MissingUrl)?;
            sanitize_url(url).map(|_| ()).ok_or(RequestError::InvalidUrl)
        }
        EndpointClass::DomainParameter => validate_domain_segment(rule, path),
        EndpointClass::VideoIdParameter => validate_video_segment(path),
        EndpointClass::Unclassified => Ok(()),
    }
}

fn validate_domain_segment(rule: &EndpointRule, path: &str) -> Result<(), RequestError> {
    let segment = segments(path).last().copied().unwrap_or_default();
    // The bare listing has no domain to check.
    if segment == rule.keyword() || validate_domain(segment) {
        Ok(())
    } else {
        Err(RequestError::InvalidDomain)
    }
}

fn validate_video_segment(path: &str) -> Result<(), RequestError> {
    let segments = segments(path);
    let id = match segments.as_slice() {
        [.., id, last] if *last == VIDEO_INFO_SUFFIX => *id,
        [.., last] => *last,
        [] => "",
    };

    if validate_youtube_id(id) {
        Ok(())
    } else {
        Err(RequestError::InvalidVideoId)
    }
}
