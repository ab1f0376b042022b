//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint path (gateway prefix removed) + raw query
//!     → path.rs (decode, resolve dot segments)
//!     → params.rs (decode query pairs)
//!     → endpoint.rs (ordered prefix table → EndpointClass)
//!     → validator.rs (class rule → Ok or RequestError)
//! ```

pub mod endpoint;
pub mod params;
pub mod path;
pub mod validator;

pub use endpoint::{classify, EndpointClass, EndpointRule, ENDPOINT_RULES};
pub use params::QueryParams;
pub use path::EndpointPath;
pub use validator::{validate_request, RequestError};
