//! Transport-decoupled endpoints hosted by axum.
//!
//! Business logic is written as an [`Endpoint`]: an async function from a
//! typed request to a typed response that knows nothing about HTTP. An
//! [`http::Server`] wraps one endpoint with the functions that translate
//! between HTTP and those types, and mounts on an axum router as a tower
//! service.
//!
//! ```text
//! request → before hooks → decode → endpoint → after hooks → encode → response
//!                            └──────────┴───────────────────────┴→ error handler → error encoder
//!                                                            (always) → finalizers
//! ```

pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use context::RequestContext;
pub use endpoint::{nop_endpoint, BoxEndpoint, Endpoint};
pub use error::{BoxError, Error, ErrorHandler, LogErrorHandler};
pub use http::Server;
pub use lifecycle::Shutdown;
