//! ProxyGrid API gateway library.
//!
//! Rate-limits, validates and sanitizes requests for a fixed catalog of
//! third-party data endpoints, forwards them to the aggregation backend and
//! reshapes the answer with a path-derived cache policy.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
