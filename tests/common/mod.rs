//! Shared utilities for server integration tests.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{Method, Request, Response};
use gkit::http::{Exchange, Server};
use gkit::Error;
use serde::{Deserialize, Serialize};

/// Request/response type carrying nothing.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Empty;

impl gkit::http::ResponseMetadata for Empty {}

/// A `POST /dummy` exchange with an empty body.
pub fn dummy_exchange() -> Exchange {
    exchange(Method::POST, "/dummy", "")
}

pub fn exchange(method: Method, uri: &str, body: &'static str) -> Exchange {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::from_static(body.as_bytes()))
        .unwrap();
    Exchange::new(request)
}

/// Serves a `POST /dummy` exchange and returns it with the pipeline result.
pub async fn handle_with<Req, Res>(server: &Server<Req, Res>) -> (Exchange, Result<(), Error>)
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    let mut exchange = dummy_exchange();
    let result = server.serve(&mut exchange).await;
    (exchange, result)
}

/// Collects a response body.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
