//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Provide an access-log finalizer for endpoint servers
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - One INFO event per request, emitted after the response is written

use axum::http::StatusCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::context::RequestContext;
use crate::http::Exchange;

/// Installs the global subscriber. `default_level` is an `EnvFilter`
/// directive such as `info` or `gkit=debug,tower_http=debug`.
///
/// Returns an error if a global subscriber is already installed.
pub fn init(default_level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

/// Finalizer logging method, path, status, response size and request id.
///
/// Method and path come from the context when a before-hook populated it,
/// otherwise from the exchange.
pub fn access_log(ctx: &RequestContext, status: StatusCode, exchange: &Exchange) {
    tracing::info!(
        request_id = ctx.request_id().unwrap_or("-"),
        method = %ctx.request_method().unwrap_or(exchange.method()),
        path = ctx.request_path().unwrap_or(exchange.uri().path()),
        status = status.as_u16(),
        size = ctx.response_size().unwrap_or(exchange.size()),
        "Request completed"
    );
}
