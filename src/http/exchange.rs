//! Native request/response carrier handed to every pipeline stage.
//!
//! # Responsibilities
//! - Hold the request head, captured path parameters and the buffered body
//! - Accumulate the response (status, headers, body) as stages write it
//! - Report what was written (status, header snapshot, byte count)
//!
//! # Design Decisions
//! - The body is buffered before the pipeline runs; a buffering failure is
//!   kept and surfaces from [`Exchange::body`] so it takes the decode error path
//! - The first status written wins, later ones are ignored with a warning
//! - Writing body bytes without a status commits `200 OK`
//! - A path parameter the router could not decode is kept as an error and
//!   surfaces from [`Exchange::path`] and [`Exchange::bind`]

use std::error::Error as StdError;

use axum::{
    body::{Body, Bytes},
    extract::{rejection::RawPathParamsRejection, FromRequestParts, RawPathParams, Request},
    http::{header, request, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::Response,
};
use http_body_util::LengthLimitError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::http::bind::Fields;

const APPLICATION_JSON: &str = "application/json; charset=utf-8";

#[derive(Debug, Clone)]
struct BodyError {
    status: StatusCode,
    message: String,
}

/// One HTTP exchange: the request as received and the response being built.
#[derive(Debug)]
pub struct Exchange {
    head: request::Parts,
    params: Vec<(String, String)>,
    params_error: Option<String>,
    body: Result<Bytes, BodyError>,
    status: Option<StatusCode>,
    headers: HeaderMap,
    written: Vec<u8>,
}

impl Exchange {
    /// Builds an exchange from an already-buffered request.
    pub fn new(request: axum::http::Request<Bytes>) -> Self {
        let (head, body) = request.into_parts();
        Self::from_parts(head, Ok(body))
    }

    fn from_parts(head: request::Parts, body: Result<Bytes, BodyError>) -> Self {
        Self {
            head,
            params: Vec::new(),
            params_error: None,
            body,
            status: None,
            headers: HeaderMap::new(),
            written: Vec::new(),
        }
    }

    /// Buffers the body of an axum request (at most `limit` bytes) and
    /// captures the path parameters the router matched.
    pub async fn read(request: Request, limit: usize) -> Self {
        let (mut head, body) = request.into_parts();

        // Served outside a router there are no params to capture.
        let (params, params_error) = match RawPathParams::from_request_parts(&mut head, &()).await {
            Ok(raw) => (
                raw.iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect(),
                None,
            ),
            Err(RawPathParamsRejection::MissingPathParams(_)) => (Vec::new(), None),
            Err(rejection) => (Vec::new(), Some(rejection.body_text())),
        };

        let body = axum::body::to_bytes(body, limit).await.map_err(|e| {
            if exceeds_limit(&e) {
                BodyError {
                    status: StatusCode::PAYLOAD_TOO_LARGE,
                    message: format!("request body exceeds {limit} bytes"),
                }
            } else {
                BodyError {
                    status: StatusCode::BAD_REQUEST,
                    message: format!("failed to read request body: {e}"),
                }
            }
        });

        let mut exchange = Self::from_parts(head, body);
        exchange.params = params;
        exchange.params_error = params_error;
        exchange
    }

    /// Adds a path parameter, as the router would.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    // --- Request side ---

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn request_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.head.headers
    }

    /// Case-insensitive request header lookup. Non-UTF-8 values are skipped.
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The buffered request body.
    pub fn body(&self) -> Result<&Bytes, Error> {
        self.body.as_ref().map_err(|e| Error::msg(e.message.clone()).with_status(e.status))
    }

    /// Deserializes the request body as JSON. Unlike [`Exchange::bind`], an
    /// empty body is rejected.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let body = self.body()?;
        serde_json::from_slice(body).map_err(bad_request)
    }

    /// Deserializes the path parameters. Values are parsed into whatever the
    /// target field holds, so `"123"` fills an integer field.
    pub fn path<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.path_fields()?.deserialize().map_err(bad_request)
    }

    /// Deserializes path parameters, then query parameters (GET, DELETE and
    /// HEAD only), then the JSON body into one value. Later sources replace
    /// fields set by earlier ones. An empty body binds nothing.
    ///
    /// A body that is not a JSON object is deserialized on its own.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let body = self.body()?;
        let json = if body.is_empty() {
            None
        } else {
            Some(serde_json::from_slice::<Value>(body).map_err(bad_request)?)
        };

        let object = match json {
            Some(Value::Object(object)) => Some(object),
            Some(other) => return serde_json::from_value(other).map_err(bad_request),
            None => None,
        };

        let mut fields = self.path_fields()?;
        if matches!(self.head.method, Method::GET | Method::DELETE | Method::HEAD) {
            let query: Vec<(String, String)> =
                serde_urlencoded::from_str(self.head.uri.query().unwrap_or("")).map_err(bad_request)?;
            fields.extend_text(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        if let Some(object) = object {
            fields.extend_json(object);
        }

        fields.deserialize().map_err(bad_request)
    }

    fn path_fields(&self) -> Result<Fields, Error> {
        if let Some(message) = &self.params_error {
            return Err(Error::msg(message.clone()).with_status(StatusCode::BAD_REQUEST));
        }
        let mut fields = Fields::default();
        fields.extend_text(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Ok(fields)
    }

    /// Deserializes the query string.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_urlencoded::from_str(self.head.uri.query().unwrap_or("")).map_err(bad_request)
    }

    // --- Response side ---

    pub fn response_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Headers written after the status is committed are still sent, since
    /// the response is only materialized once the pipeline finishes.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Commits the response status. Only the first call has an effect.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(committed) => tracing::warn!(
                committed = committed.as_u16(),
                ignored = status.as_u16(),
                "Superfluous write_header call"
            ),
        }
    }

    /// Appends body bytes, committing `200 OK` if no status was written.
    pub fn write(&mut self, bytes: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.written.extend_from_slice(bytes);
    }

    /// Writes a complete response with the given content type.
    pub fn blob(&mut self, status: StatusCode, content_type: &str, body: &[u8]) {
        match HeaderValue::from_str(content_type) {
            Ok(value) => {
                self.headers.insert(header::CONTENT_TYPE, value);
            }
            Err(_) => tracing::warn!(content_type, "Invalid content type"),
        }
        self.write_header(status);
        self.write(body);
    }

    /// Serializes `value` as a JSON response.
    pub fn json_response<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        value: &T,
    ) -> Result<(), Error> {
        let body = serde_json::to_vec(value)?;
        self.blob(status, APPLICATION_JSON, &body);
        Ok(())
    }

    /// Writes a body-less response.
    pub fn no_content(&mut self, status: StatusCode) {
        self.write_header(status);
    }

    /// Committed status, or `200 OK` if nothing was written yet.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// True once a status or body bytes were written.
    pub fn committed(&self) -> bool {
        self.status.is_some()
    }

    /// Number of body bytes written.
    pub fn size(&self) -> u64 {
        self.written.len() as u64
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Materializes the written response.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.written));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

fn bad_request(err: impl Into<crate::error::BoxError>) -> Error {
    Error::new(err).with_status(StatusCode::BAD_REQUEST)
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
