//! Ready-made before-hooks.

use axum::http::{header, HeaderName, HeaderValue};

use crate::context::RequestContext;
use crate::http::exchange::Exchange;

/// Request header carrying the correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Copies request method, path, path-and-query and `X-Request-Id` into the
/// context.
pub fn populate_request_context(ctx: RequestContext, exchange: &mut Exchange) -> RequestContext {
    let uri = exchange
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| exchange.uri().path().to_owned());

    let ctx = ctx
        .with_request_method(exchange.method().clone())
        .with_request_path(exchange.uri().path())
        .with_request_uri(uri);

    match exchange.request_header(X_REQUEST_ID) {
        Some(id) => ctx.with_request_id(id),
        None => ctx,
    }
}

/// Sets a response header.
pub fn set_response_header(
    name: HeaderName,
    value: HeaderValue,
) -> impl Fn(RequestContext, &mut Exchange) -> RequestContext + Clone + Send + Sync + 'static {
    move |ctx, exchange| {
        exchange.response_headers_mut().insert(name.clone(), value.clone());
        ctx
    }
}

/// Sets the `Content-Type` response header.
pub fn set_content_type(
    value: HeaderValue,
) -> impl Fn(RequestContext, &mut Exchange) -> RequestContext + Clone + Send + Sync + 'static {
    set_response_header(header::CONTENT_TYPE, value)
}

/// Sets a request header, e.g. to normalize `Accept` before decoding.
pub fn set_request_header(
    name: HeaderName,
    value: HeaderValue,
) -> impl Fn(RequestContext, &mut Exchange) -> RequestContext + Clone + Send + Sync + 'static {
    move |ctx, exchange| {
        exchange.request_headers_mut().insert(name.clone(), value.clone());
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{Method, Request};

    fn exchange(method: Method, uri: &str) -> Exchange {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Request-Id", "a1b2c3d4e5")
            .body(Bytes::new())
            .unwrap();
        Exchange::new(request)
    }

    #[test]
    fn test_populate_request_context() {
        let mut ex = exchange(Method::PATCH, "/search?q=sympatico");
        let ctx = populate_request_context(RequestContext::new(), &mut ex);

        assert_eq!(ctx.request_method(), Some(&Method::PATCH));
        assert_eq!(ctx.request_path(), Some("/search"));
        assert_eq!(ctx.request_uri(), Some("/search?q=sympatico"));
        assert_eq!(ctx.request_id(), Some("a1b2c3d4e5"));
    }

    #[test]
    fn test_set_response_header() {
        let mut ex = exchange(Method::POST, "/dummy");
        let hook = set_response_header(HeaderName::from_static("x-foo"), HeaderValue::from_static("12345"));
        hook(RequestContext::new(), &mut ex);

        assert_eq!(ex.response_headers()["x-foo"], "12345");
    }

    #[test]
    fn test_set_content_type() {
        let mut ex = exchange(Method::POST, "/dummy");
        set_content_type(HeaderValue::from_static("application/json"))(RequestContext::new(), &mut ex);

        assert_eq!(ex.response_headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_set_request_header() {
        let mut ex = exchange(Method::POST, "/dummy");
        set_request_header(header::ACCEPT, HeaderValue::from_static("application/json"))(
            RequestContext::new(),
            &mut ex,
        );

        assert_eq!(ex.request_header("accept"), Some("application/json"));
    }
}
