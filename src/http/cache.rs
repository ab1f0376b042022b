//! Cache-Control derivation for structured responses.
//!
//! An ordered table of path predicates; the first predicate that holds picks
//! the directive. Order matters: a video path may also contain `content`.

/// Directive used when no rule matches.
const DEFAULT_MAX_AGE: u32 = 300;

struct CacheRule {
    matches: fn(&str) -> bool,
    max_age: u32,
    stale_while_revalidate: Option<u32>,
}

const CACHE_RULES: &[CacheRule] = &[
    CacheRule {
        matches: |p| p.contains("/video/") && p.ends_with("/info"),
        max_age: 604_800,
        stale_while_revalidate: Some(86_400),
    },
    CacheRule {
        matches: |p| p.contains("/video/"),
        max_age: 2_592_000,
        stale_while_revalidate: Some(432_000),
    },
    CacheRule {
        matches: |p| p.contains("/search"),
        max_age: 14_400,
        stale_while_revalidate: Some(3_600),
    },
    CacheRule {
        matches: |p| p.contains("social/instagram") || p.contains("social/tiktok"),
        max_age: 86_400,
        stale_while_revalidate: Some(14_400),
    },
    CacheRule {
        matches: |p| p.contains("social/reddit") || p.contains("social/twitter"),
        max_age: 900,
        stale_while_revalidate: Some(300),
    },
    CacheRule {
        matches: |p| p.contains("content/markdown"),
        max_age: 86_400,
        stale_while_revalidate: Some(14_400),
    },
    CacheRule {
        matches: |p| p.contains("content/screenshot"),
        max_age: 3_600,
        stale_while_revalidate: Some(600),
    },
    CacheRule {
        matches: |p| p.contains("content/similarweb"),
        max_age: 604_800,
        stale_while_revalidate: Some(86_400),
    },
    CacheRule {
        matches: |p| p.contains("content/hackernews"),
        max_age: 900,
        stale_while_revalidate: Some(300),
    },
    CacheRule {
        matches: |p| p.contains("/commerce"),
        max_age: 86_400,
        stale_while_revalidate: Some(14_400),
    },
];

/// `Cache-Control` value for an endpoint path.
pub fn cache_control_for(path: &str) -> String {
    let normalized = normalize(path);
    match CACHE_RULES.iter().find(|rule| (rule.matches)(&normalized)) {
        Some(rule) => directive(rule.max_age, rule.stale_while_revalidate),
        None => directive(DEFAULT_MAX_AGE, None),
    }
}

/// `public, max-age=N[, stale-while-revalidate=M]`.
pub fn directive(max_age: u32, stale_while_revalidate: Option<u32>) -> String {
    match stale_while_revalidate {
        Some(swr) => format!("public, max-age={max_age}, stale-while-revalidate={swr}"),
        None => format!("public, max-age={max_age}"),
    }
}

fn normalize(path: &str) -> String {
    let lower = path.to_ascii_lowercase();
    let trimmed = lower.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
