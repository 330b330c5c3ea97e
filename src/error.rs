//! Pipeline error type and diagnostic error handlers.
//!
//! # Responsibilities
//! - Carry decode, endpoint and encode failures through the server pipeline
//! - Expose optional wire overrides (status, headers, JSON body) as explicit fields
//! - Report errors for diagnostics without touching the response
//!
//! # Design Decisions
//! - `Error` does not implement `std::error::Error` so that any std error
//!   converts into it with `?`
//! - A JSON body is serialized eagerly; a failed serialization is kept and
//!   the default error encoder falls back to plain text

use std::error::Error as StdError;
use std::fmt;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

use crate::context::RequestContext;
use crate::http::codec::append_headers;

/// Boxed error accepted as the cause of an [`Error`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A specialized `Result` for pipeline stages.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error produced by any stage of the server pipeline.
///
/// The message written by the default error encoder is the `Display` of the
/// cause. Status, headers and JSON body are opt-in:
///
/// ```rust
/// use axum::http::StatusCode;
/// use gkit::Error;
///
/// let err = Error::msg("not enough credit")
///     .with_status(StatusCode::PAYMENT_REQUIRED)
///     .with_header("x-balance", "0")
///     .with_json(&serde_json::json!({ "err": "not enough credit" }));
/// assert_eq!(err.status(), Some(StatusCode::PAYMENT_REQUIRED));
/// ```
pub struct Error {
    source: BoxError,
    status: Option<StatusCode>,
    headers: HeaderMap,
    json: Option<Result<Bytes, serde_json::Error>>,
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

impl Error {
    /// Wraps an error value.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self {
            source: err.into(),
            status: None,
            headers: HeaderMap::new(),
            json: None,
        }
    }

    /// Creates an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Overrides the default 500 status of the error response.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Appends a header to the error response.
    ///
    /// Invalid header names or values are dropped with a warning.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid error header"),
        }
        self
    }

    /// Appends every header of `headers` to the error response.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        append_headers(&mut self.headers, headers);
        self
    }

    /// Uses the JSON form of `body` as the error response body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.json = Some(serde_json::to_vec(body).map(Bytes::from));
        self
    }

    /// Uses already-serialized JSON bytes as the error response body.
    pub fn with_json_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.json = Some(Ok(body.into()));
        self
    }

    /// Status override, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Extra response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The JSON body, if one was attached. The inner `Err` is a failed
    /// serialization.
    pub fn json(&self) -> Option<&Result<Bytes, serde_json::Error>> {
        self.json.as_ref()
    }

    /// Underlying cause.
    pub fn source(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.source.as_ref()
    }

    /// Returns the cause if it is of type `T`.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.source.downcast_ref::<T>()
    }

    /// Returns true if the cause is of type `T`.
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.source.is::<T>()
    }

    /// Consumes the error, returning its cause.
    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

impl<E> From<E> for Error
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::new(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("source", &self.source)
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("json", &self.json.as_ref().map(|body| body.is_ok()))
            .finish()
    }
}

// --- Error handlers ---

/// Receives pipeline errors for diagnostic purposes, usually logging.
///
/// Runs before the error encoder and never changes the response.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(&self, ctx: &RequestContext, err: &Error);
}

impl<F> ErrorHandler for F
where
    F: Fn(&RequestContext, &Error) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &RequestContext, err: &Error) {
        self(ctx, err)
    }
}

type LogFn = Box<dyn Fn(&RequestContext, &Error) + Send + Sync>;

/// The default [`ErrorHandler`]: logs the error at ERROR level together with
/// whatever request metadata the context holds.
#[derive(Default)]
pub struct LogErrorHandler {
    log: Option<LogFn>,
}

impl LogErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default log event with `log`.
    pub fn with(log: impl Fn(&RequestContext, &Error) + Send + Sync + 'static) -> Self {
        Self { log: Some(Box::new(log)) }
    }
}

impl ErrorHandler for LogErrorHandler {
    fn handle(&self, ctx: &RequestContext, err: &Error) {
        match &self.log {
            Some(log) => log(ctx, err),
            None => tracing::error!(
                request_id = ctx.request_id().unwrap_or("-"),
                method = ctx.request_method().map(|m| m.as_str()).unwrap_or("-"),
                path = ctx.request_path().unwrap_or("-"),
                status = err.status().map(|s| s.as_u16()),
                error = %err,
                "Request failed"
            ),
        }
    }
}

impl fmt::Debug for LogErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogErrorHandler")
            .field("custom", &self.log.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct Teapot;

    impl fmt::Display for Teapot {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("teapot")
        }
    }

    impl StdError for Teapot {}

    #[test]
    fn test_display_is_cause_message() {
        assert_eq!(Error::msg("dang").to_string(), "dang");
        assert_eq!(Error::from(Teapot).to_string(), "teapot");
    }

    #[test]
    fn test_downcast() {
        let err: Error = Teapot.into();
        assert!(err.is::<Teapot>());
        assert!(err.downcast_ref::<Teapot>().is_some());
        assert!(!Error::msg("teapot").is::<Teapot>());
    }

    #[test]
    fn test_question_mark_conversion() {
        fn parse() -> Result<i32> {
            Ok("nope".parse::<i32>()?)
        }
        let err = parse().unwrap_err();
        assert!(err.is::<std::num::ParseIntError>());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_headers_append() {
        let mut extra = HeaderMap::new();
        extra.append("vary", HeaderValue::from_static("Origin"));
        extra.append("vary", HeaderValue::from_static("User-Agent"));

        let err = Error::msg("oh no")
            .with_header("x-one", "1")
            .with_headers(extra)
            .with_header("bad header", "x");

        assert_eq!(err.headers().get("x-one").unwrap(), "1");
        let vary: Vec<_> = err.headers().get_all("vary").iter().collect();
        assert_eq!(vary, vec!["Origin", "User-Agent"]);
        assert_eq!(err.headers().len(), 3);
    }

    #[test]
    fn test_failed_json_is_kept() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "tuple keys cannot be JSON object keys");

        let err = Error::msg("boom").with_json(&map);
        assert!(matches!(err.json(), Some(Err(_))));

        let err = Error::msg("boom").with_json(&serde_json::json!({"err": "boom"}));
        assert_eq!(err.json().unwrap().as_ref().unwrap().as_ref(), br#"{"err":"boom"}"#);
    }

    #[test]
    fn test_custom_log_error_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler = LogErrorHandler::with(move |_ctx, err| {
            sink.lock().unwrap().push(err.to_string());
        });

        handler.handle(&RequestContext::new(), &Error::msg("teapot"));
        assert_eq!(*seen.lock().unwrap(), vec!["teapot".to_string()]);
    }
}
