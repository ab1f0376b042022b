//! Input sanitization and validation helpers.
//!
//! Pure functions: no I/O, no shared state. Everything the gateway forwards
//! upstream passes through here first.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use url::Url;

use crate::routing::params::QueryParams;

/// Longest value `sanitize_input` will return, in characters.
pub const MAX_INPUT_LENGTH: usize = 1000;
/// Longest URL `sanitize_url` accepts, in characters.
pub const MAX_URL_LENGTH: usize = 2048;
/// Longest search query `validate_search_query` accepts, in characters.
pub const MAX_QUERY_LENGTH: usize = 500;

const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;
const YOUTUBE_ID_LENGTH: usize = 11;

const SCRIPT_SCHEMES: [&str; 2] = ["javascript:", "vbscript:"];

/// Query parameters after cleaning, ordered by key.
pub type SanitizedQuery = BTreeMap<String, String>;

/// Why a search query was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchQueryError {
    #[error("Search query cannot be empty")]
    Empty,
    #[error("Search query is too long (max 500 characters)")]
    TooLong,
    #[error("Search query contains invalid characters")]
    InvalidCharacters,
}

/// Strip control characters, HTML-significant characters and script scheme
/// markers, trim, and cap the length. Never fails.
pub fn sanitize_input(raw: &str) -> String {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | '"' | '`'))
        .collect();
    while let Some((start, len)) = find_script_scheme(&cleaned) {
        cleaned.replace_range(start..start + len, "");
    }

    cleaned.trim().chars().take(MAX_INPUT_LENGTH).collect()
}

/// Accept only absolute http/https URLs with a host.
///
/// Returns the parsed URL's serialization, which equals the input for URLs
/// that are already in canonical form.
pub fn sanitize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.chars().count() > MAX_URL_LENGTH
        || trimmed.chars().any(char::is_control)
    {
        return None;
    }

    let url = Url::parse(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().map_or(true, str::is_empty) {
        return None;
    }

    Some(url.to_string())
}

/// Validate a free-text search query.
pub fn validate_search_query(raw: &str) -> Result<(), SearchQueryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SearchQueryError::Empty);
    }
    if trimmed.chars().count() > MAX_QUERY_LENGTH {
        return Err(SearchQueryError::TooLong);
    }
    if trimmed.chars().any(|c| c.is_control() || c == '<' || c == '>')
        || find_script_scheme(trimmed).is_some()
    {
        return Err(SearchQueryError::InvalidCharacters);
    }
    Ok(())
}

/// True iff `raw` is a syntactically valid DNS hostname with a TLD.
pub fn validate_domain(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > MAX_DOMAIN_LENGTH || !raw.contains('.') {
        return false;
    }

    let labels: Vec<&str> = raw.split('.').collect();
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LENGTH
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    });

    let tld_ok = labels.last().is_some_and(|tld| {
        (2..=MAX_LABEL_LENGTH).contains(&tld.len()) && tld.bytes().all(|b| b.is_ascii_alphabetic())
    });

    labels_ok && tld_ok
}

/// True iff `raw` has the shape of a YouTube video id.
pub fn validate_youtube_id(raw: &str) -> bool {
    raw.len() == YOUTUBE_ID_LENGTH
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Uniform `{"error": message}` response.
pub fn create_error_response(message: &str, status: StatusCode) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Clean every query parameter for forwarding.
///
/// `url` values are canonicalized by [`sanitize_url`] when they parse; every
/// other value (and any rejected URL) goes through [`sanitize_input`]. The
/// first occurrence of a repeated key wins.
pub fn sanitize_query(params: &QueryParams) -> SanitizedQuery {
    let mut sanitized = SanitizedQuery::new();
    for (key, value) in params.iter() {
        let key = sanitize_input(key);
        if key.is_empty() || sanitized.contains_key(&key) {
            continue;
        }
        let value = if key == "url" {
            sanitize_url(value).unwrap_or_else(|| sanitize_input(value))
        } else {
            sanitize_input(value)
        };
        sanitized.insert(key, value);
    }
    sanitized
}

/// Byte offset and length of the first script scheme marker, ignoring case.
fn find_script_scheme(s: &str) -> Option<(usize, usize)> {
    let lower = s.to_ascii_lowercase();
    SCRIPT_SCHEMES
        .iter()
        .filter_map(|scheme| lower.find(scheme).map(|pos| (pos, scheme.len())))
        .min_by_key(|(pos, _)| *pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_input_strips_control_and_html() {
        assert_eq!(sanitize_input("  hello\u{0}\n<b>world</b> "), "hellobworld/b");
        assert_eq!(sanitize_input("say \"hi\" `now`"), "say hi now");
        assert_eq!(sanitize_input("rust's book & more"), "rust's book & more");
    }

    #[test]
    fn test_sanitize_input_removes_script_schemes() {
        assert_eq!(sanitize_input("JavaScript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_input("javajavascript:script:x"), "x");
        assert_eq!(sanitize_input("vbscript:msgbox"), "msgbox");
    }

    #[test]
    fn test_sanitize_input_never_returns_control_chars() {
        let all: String = ('\u{0}'..='\u{a0}').collect();
        let out = sanitize_input(&all);
        assert!(!out.chars().any(char::is_control), "{:?}", out);
        assert!(!out.contains(['<', '>', '"', '`']));
        assert_eq!(out, out.trim());

        for c in '\u{0}'..='\u{a0}' {
            let embedded = sanitize_input(&format!("a{c}b"));
            let expected = if c.is_control() || matches!(c, '<' | '>' | '"' | '`') {
                "ab".to_string()
            } else {
                format!("a{c}b")
            };
            assert_eq!(embedded, expected, "U+{:04X}", c as u32);

            let alone = sanitize_input(&format!(" {c}{c} "));
            assert!(!alone.chars().any(char::is_control), "U+{:04X} -> {:?}", c as u32, alone);
            assert_eq!(alone, alone.trim(), "U+{:04X}", c as u32);
        }

        let mixed = [
            "\u{7}\u{1b}[31mred\u{1b}[0m",
            "\r\n\t  padded\u{a0}",
            "a\u{85}b\u{9f}c",
            "\u{0}java\u{0}script:\u{0}x",
            "<\u{1}script\u{2}>",
        ];
        for input in mixed {
            let out = sanitize_input(input);
            assert!(!out.chars().any(char::is_control), "{:?} -> {:?}", input, out);
            assert_eq!(out, out.trim(), "{:?}", input);
        }
        assert_eq!(sanitize_input("\u{0}java\u{0}script:\u{0}x"), "x");
        assert_eq!(sanitize_input("\r\n\t  padded\u{a0}"), "padded");
    }

    #[test]
    fn test_sanitize_input_caps_length() {
        let long = "é".repeat(MAX_INPUT_LENGTH + 50);
        assert_eq!(sanitize_input(&long).chars().count(), MAX_INPUT_LENGTH);
    }

    #[test]
    fn test_sanitize_url() {
        assert_eq!(sanitize_url("not a url"), None);
        assert_eq!(
            sanitize_url("https://example.com/a?b=1").as_deref(),
            Some("https://example.com/a?b=1")
        );
        assert_eq!(sanitize_url("ftp://example.com/file"), None);
        assert_eq!(sanitize_url("javascript:alert(1)"), None);
        assert_eq!(sanitize_url("https://exa\tmple.com"), None);
        assert_eq!(sanitize_url(""), None);

        let too_long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(sanitize_url(&too_long), None);
    }

    #[test]
    fn test_sanitize_url_is_stable() {
        let once = sanitize_url("http://Example.COM/path?x=1#frag").unwrap();
        assert_eq!(sanitize_url(&once).as_deref(), Some(once.as_str()));
    }

    #[test]
    fn test_validate_search_query() {
        assert!(validate_search_query("rust async runtime").is_ok());
        assert_eq!(validate_search_query("   "), Err(SearchQueryError::Empty));
        assert_eq!(
            validate_search_query(&"q".repeat(MAX_QUERY_LENGTH + 1)),
            Err(SearchQueryError::TooLong)
        );
        assert_eq!(
            validate_search_query("<script>alert(1)</script>"),
            Err(SearchQueryError::InvalidCharacters)
        );
        assert_eq!(
            validate_search_query("JAVASCRIPT:void(0)"),
            Err(SearchQueryError::InvalidCharacters)
        );
        assert_eq!(
            validate_search_query("line\u{0}break"),
            Err(SearchQueryError::InvalidCharacters)
        );
    }

    #[test]
    fn test_validate_domain() {
        assert!(validate_domain("example.com"));
        assert!(validate_domain("sub.my-site.co.uk"));
        assert!(!validate_domain("bad_domain"));
        assert!(!validate_domain("similarweb"));
        assert!(!validate_domain("-bad.com"));
        assert!(!validate_domain("bad-.com"));
        assert!(!validate_domain("example.c"));
        assert!(!validate_domain("example.c0m"));
        assert!(!validate_domain("a..com"));
        assert!(!validate_domain(&format!("{}.com", "a".repeat(64))));
    }

    #[test]
    fn test_validate_youtube_id() {
        assert!(validate_youtube_id("dQw4w9WgXcQ"));
        assert!(validate_youtube_id("a-b_c-d_e-f"));
        assert!(!validate_youtube_id("short"));
        assert!(!validate_youtube_id("dQw4w9WgXcQX"));
        assert!(!validate_youtube_id("bad!id00000"));
    }

    #[tokio::test]
    async fn test_create_error_response() {
        let response = create_error_response("Invalid URL format", StatusCode::BAD_REQUEST);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "Invalid URL format" }));
    }

    #[test]
    fn test_sanitize_query() {
        let params = QueryParams::parse(Some(
            "url=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1&q=%3Cb%3Erust&q=second&%3C%3E=x&type=top",
        ));
        let sanitized = sanitize_query(&params);

        let expected: SanitizedQuery = [
            ("q".to_string(), "brust".to_string()),
            ("type".to_string(), "top".to_string()),
            ("url".to_string(), "https://example.com/a?b=1".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(sanitized, expected);
    }
}
