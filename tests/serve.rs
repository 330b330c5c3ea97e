//! End-to-end: endpoints served on a real socket and called over HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use gkit::http::{decode_json_request, encode_json_response, populate_request_context, RequestIdLayer, Server};
use gkit::lifecycle::serve;
use gkit::{Error, RequestContext, Shutdown};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Deserialize)]
struct UppercaseRequest {
    s: String,
}

#[derive(Debug, Serialize)]
struct UppercaseResponse {
    v: String,
}

impl gkit::http::ResponseMetadata for UppercaseResponse {}

async fn uppercase(_ctx: RequestContext, req: UppercaseRequest) -> Result<UppercaseResponse, Error> {
    if req.s.is_empty() {
        return Err(Error::msg("empty string")
            .with_status(StatusCode::BAD_REQUEST)
            .with_json(&serde_json::json!({ "err": "empty string" })));
    }
    Ok(UppercaseResponse { v: req.s.to_uppercase() })
}

/// Starts a server on an ephemeral port.
async fn start() -> (SocketAddr, Shutdown, JoinHandle<std::io::Result<()>>) {
    let server = Server::builder(
        uppercase,
        decode_json_request::<UppercaseRequest>,
        encode_json_response::<UppercaseResponse>,
    )
    .before(populate_request_context)
    .build();
    let router = Router::new().route_service("/uppercase", server).layer(RequestIdLayer);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(serve(listener, router, shutdown.subscribe()));

    (addr, shutdown, handle)
}

#[tokio::test]
async fn test_uppercase_over_http() {
    let (addr, shutdown, handle) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/uppercase"))
        .json(&serde_json::json!({ "s": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "v": "HELLO" }));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_error_body_over_http() {
    let (addr, shutdown, _handle) = start().await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/uppercase"))
        .json(&serde_json::json!({ "s": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["err"], "empty string");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (addr, shutdown, _handle) = start().await;

    let response = reqwest::get(format!("http://{addr}/nope")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    shutdown.trigger();
}
