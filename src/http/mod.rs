//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request id)
//!     → handler.rs (rate limit, validate, sanitize)
//!     → upstream.rs (forward to backend)
//!     → response.rs (shape by content type; cache.rs picks Cache-Control)
//!     → Send to client
//! ```

pub mod cache;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use cache::cache_control_for;
pub use handler::AppState;
pub use request::X_REQUEST_ID;
pub use response::ResponseShape;
pub use server::GatewayServer;
pub use upstream::{UpstreamClient, UpstreamError};
