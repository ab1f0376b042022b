//! Endpoint path normalization.
//!
//! The inbound path is percent-decoded and its dot segments resolved once,
//! before classification. Validation, the cache policy and the upstream URL
//! all see the same segments, so a path cannot be classified as one endpoint
//! and delivered to another.

use percent_encoding::percent_decode_str;

use crate::routing::validator::RequestError;

/// A decoded endpoint path (gateway prefix already removed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPath {
    segments: Vec<String>,
    path: String,
}

impl EndpointPath {
    /// Decode and normalize a raw request path.
    ///
    /// Rejects paths that climb above the route root, segments that decode
    /// to a path separator or a control character, and invalid UTF-8.
    pub fn parse(raw: &str) -> Result<Self, RequestError> {
        let mut segments: Vec<String> = Vec::new();

        for raw_segment in raw.split('/') {
            let segment = percent_decode_str(raw_segment)
                .decode_utf8()
                .map_err(|_| RequestError::InvalidPath)?;

            match segment.as_ref() {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(RequestError::InvalidPath);
                    }
                }
                s if s.contains(['/', '\\']) || s.chars().any(char::is_control) => {
                    return Err(RequestError::InvalidPath);
                }
                s => segments.push(s.to_string()),
            }
        }

        let path = format!("/{}", segments.join("/"));
        Ok(Self { segments, path })
    }

    /// Canonical `/a/b/c` form.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Decoded segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
}

impl std::fmt::Display for EndpointPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
