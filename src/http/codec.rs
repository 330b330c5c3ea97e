//! Default decode, encode and error-encode functions.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::context::RequestContext;
use crate::error::Error;
use crate::http::exchange::Exchange;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json; charset=utf-8";

/// Wire-level overrides a response type may expose to
/// [`encode_json_response`].
///
/// Both methods default to `None`, so opting in is an empty impl:
///
/// ```rust
/// use axum::http::StatusCode;
/// use gkit::http::ResponseMetadata;
///
/// #[derive(serde::Serialize)]
/// struct Created { id: u64 }
///
/// impl ResponseMetadata for Created {
///     fn status_code(&self) -> Option<StatusCode> {
///         Some(StatusCode::CREATED)
///     }
/// }
/// ```
pub trait ResponseMetadata {
    /// Replaces the default `200 OK`.
    fn status_code(&self) -> Option<StatusCode> {
        None
    }

    /// Appended to the response headers, next to any set earlier.
    fn headers(&self) -> Option<HeaderMap> {
        None
    }
}

impl ResponseMetadata for () {}
impl ResponseMetadata for String {}
impl ResponseMetadata for serde_json::Value {}
impl<T: ResponseMetadata> ResponseMetadata for Vec<T> {}

impl<T: ResponseMetadata> ResponseMetadata for Option<T> {
    fn status_code(&self) -> Option<StatusCode> {
        self.as_ref().and_then(ResponseMetadata::status_code)
    }

    fn headers(&self) -> Option<HeaderMap> {
        self.as_ref().and_then(ResponseMetadata::headers)
    }
}

/// Binds the path parameters, the query string (GET, DELETE and HEAD) and the
/// JSON body into `Req`. See [`Exchange::bind`].
pub fn decode_json_request<Req: DeserializeOwned>(
    _ctx: &RequestContext,
    exchange: &Exchange,
) -> Result<Req, Error> {
    exchange.bind()
}

/// Encodes `response` as JSON, applying its [`ResponseMetadata`].
///
/// A `204 No Content` status writes no body whatever the response holds.
pub fn encode_json_response<Res: Serialize + ResponseMetadata>(
    _ctx: &RequestContext,
    exchange: &mut Exchange,
    response: Res,
) -> Result<(), Error> {
    if let Some(headers) = response.headers() {
        append_headers(exchange.response_headers_mut(), headers);
    }

    let status = response.status_code().unwrap_or(StatusCode::OK);
    if status == StatusCode::NO_CONTENT {
        exchange.no_content(status);
        return Ok(());
    }

    exchange.json_response(status, &response)
}

/// Writes `err` to the exchange.
///
/// Body is the error message as `text/plain` with status 500. A JSON body
/// on the error replaces it (as `application/json`) unless its serialization
/// failed. Error headers are appended after the content type is set, and a
/// status override on the error replaces 500.
pub fn default_error_encoder(_ctx: &RequestContext, exchange: &mut Exchange, err: &Error) {
    let message = err.to_string();
    let (content_type, body) = match err.json() {
        Some(Ok(json)) => (APPLICATION_JSON, json.as_ref()),
        _ => (TEXT_PLAIN, message.as_bytes()),
    };

    let headers = exchange.response_headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    append_headers(headers, err.headers().clone());

    let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    exchange.write_header(status);
    if !matches!(status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED) {
        exchange.write(body);
    }
}

/// Appends every value of `headers` to `target`, keeping repeated names.
pub(crate) fn append_headers(target: &mut HeaderMap, headers: HeaderMap) {
    let mut name = None;
    for (key, value) in headers {
        if key.is_some() {
            name = key;
        }
        if let Some(name) = &name {
            target.append(name.clone(), value);
        }
    }
}
