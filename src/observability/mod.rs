//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages produce:
//!     → tracing events (error handler, server, exchange warnings)
//!     → logging.rs access_log finalizer (one event per request)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, filtered by RUST_LOG / config)
//! ```

pub mod logging;
