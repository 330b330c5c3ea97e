//! Request-scoped context threaded through the server pipeline.
//!
//! Well-known request and response metadata lives in typed fields; anything
//! else an application needs to pass between hooks goes into a type-keyed
//! extension map. Hooks never mutate a context in place: they take it by
//! value and return it with more entries.

use axum::http::{Extensions, HeaderMap, Method};

/// Per-request values visible to hooks, decoders, endpoints, encoders and
/// finalizers.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    request_method: Option<Method>,
    request_path: Option<String>,
    request_uri: Option<String>,
    request_id: Option<String>,
    response_headers: Option<HeaderMap>,
    response_size: Option<u64>,
    values: Extensions,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_method(mut self, method: Method) -> Self {
        self.request_method = Some(method);
        self
    }

    pub fn with_request_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = Some(path.into());
        self
    }

    /// Path and query as received, e.g. `/search?q=sympatico`.
    pub fn with_request_uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = Some(uri.into());
        self
    }

    /// Value of the `X-Request-Id` request header.
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Stores an application value, keyed by its type.
    pub fn with_value<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.values.insert(value);
        self
    }

    pub(crate) fn with_response(mut self, headers: HeaderMap, size: u64) -> Self {
        self.response_headers = Some(headers);
        self.response_size = Some(size);
        self
    }

    pub fn request_method(&self) -> Option<&Method> {
        self.request_method.as_ref()
    }

    pub fn request_path(&self) -> Option<&str> {
        self.request_path.as_deref()
    }

    pub fn request_uri(&self) -> Option<&str> {
        self.request_uri.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Snapshot of the written response headers. Only set for finalizers.
    pub fn response_headers(&self) -> Option<&HeaderMap> {
        self.response_headers.as_ref()
    }

    /// Number of body bytes written. Only set for finalizers.
    pub fn response_size(&self) -> Option<u64> {
        self.response_size
    }

    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }
}
