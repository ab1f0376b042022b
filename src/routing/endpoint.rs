//! Endpoint classification.
//!
//! # Design Decisions
//! - The table is ordered by class priority: search, URL parameter, domain
//!   parameter, video id parameter. First match wins.
//! - Prefixes match on whole path segments, so `/search` does not match
//!   `/searchable`.
//! - Paths with no matching prefix are `Unclassified` and carry no parameter
//!   contract.

use std::fmt;

/// Parameter contract of an endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// Requires a `q` search query.
    Search,
    /// Requires an absolute http(s) `url` parameter.
    UrlParameter,
    /// Final path segment is a domain name.
    DomainParameter,
    /// Final path segment (or the one before `/info`) is a video id.
    VideoIdParameter,
    Unclassified,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Search => "search",
            EndpointClass::UrlParameter => "url",
            EndpointClass::DomainParameter => "domain",
            EndpointClass::VideoIdParameter => "video_id",
            EndpointClass::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointRule {
    pub prefix: &'static str,
    pub class: EndpointClass,
}

impl EndpointRule {
    const fn new(prefix: &'static str, class: EndpointClass) -> Self {
        Self { prefix, class }
    }

    /// Last segment of the prefix, e.g. `similarweb` for `/content/similarweb`.
    pub fn keyword(&self) -> &'static str {
        self.prefix.rsplit('/').next().unwrap_or(self.prefix)
    }

    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Classification table in priority order.
pub const ENDPOINT_RULES: &[EndpointRule] = &[
    EndpointRule::new("/search", EndpointClass::Search),
    EndpointRule::new("/content/markdown", EndpointClass::UrlParameter),
    EndpointRule::new("/content/screenshot", EndpointClass::UrlParameter),
    EndpointRule::new("/social/reddit", EndpointClass::UrlParameter),
    EndpointRule::new("/content/similarweb", EndpointClass::DomainParameter),
    EndpointRule::new("/video/youtube", EndpointClass::VideoIdParameter),
];

/// First rule matching `path`, if any.
pub fn match_rule(path: &str) -> Option<&'static EndpointRule> {
    ENDPOINT_RULES.iter().find(|rule| rule.matches(path))
}

/// Class of `path`.
pub fn classify(path: &str) -> EndpointClass {
    match_rule(path).map_or(EndpointClass::Unclassified, |rule| rule.class)
}

/// Non-empty path segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("/search/google"), EndpointClass::Search);
        assert_eq!(classify("/search"), EndpointClass::Search);
        assert_eq!(classify("/content/markdown"), EndpointClass::UrlParameter);
        assert_eq!(classify("/social/reddit/post"), EndpointClass::UrlParameter);
        assert_eq!(classify("/content/similarweb/example.com"), EndpointClass::DomainParameter);
        assert_eq!(classify("/video/youtube/dQw4w9WgXcQ/info"), EndpointClass::VideoIdParameter);
        assert_eq!(classify("/social/twitter/rustlang"), EndpointClass::Unclassified);
        assert_eq!(classify("/commerce/amazon/B000123"), EndpointClass::Unclassified);
    }

    #[test]
    fn test_prefix_matches_whole_segments() {
        assert_eq!(classify("/searchable"), EndpointClass::Unclassified);
        assert_eq!(classify("/content/markdownx"), EndpointClass::Unclassified);
    }

    #[test]
    fn test_table_priority_order() {
        let classes: Vec<_> = ENDPOINT_RULES.iter().map(|r| r.class).collect();
        let mut sorted = classes.clone();
        let rank = |c: &EndpointClass| match c {
            EndpointClass::Search => 0,
            EndpointClass::UrlParameter => 1,
            EndpointClass::DomainParameter => 2,
            EndpointClass::VideoIdParameter => 3,
            EndpointClass::Unclassified => 4,
        };
        sorted.sort_by_key(rank);
        assert_eq!(classes, sorted);
    }

    #[test]
    fn test_keyword() {
        assert_eq!(match_rule("/content/similarweb").unwrap().keyword(), "similarweb");
        assert_eq!(match_rule("/search/x").unwrap().keyword(), "search");
    }
}
