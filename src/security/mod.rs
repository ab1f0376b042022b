//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (identify client)
//!     → rate_limit.rs (per-client fixed window)
//!     → [routing validates parameters]
//!     → sanitize.rs (clean everything forwarded upstream)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input: raw values never reach the upstream

pub mod headers;
pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::{MemoryStore, RateLimitPolicy, RateLimitStore, RateLimitVerdict, RateLimiter};
