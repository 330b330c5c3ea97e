//! String service demo.
//!
//! Three endpoints behind one axum router:
//!
//! ```text
//! POST /uppercase     {"s":"hello"}  → {"v":"HELLO"}
//! POST /count         {"s":"hello"}  → {"v":5}
//! GET  /strings/{id}                 → {"id":1,"s":"alpha"}
//! ```
//!
//! Run with:
//!   RUST_LOG=gkit=debug cargo run -- --bind 127.0.0.1:8080

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use clap::Parser;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use gkit::config::{load_config, validate_config, AppConfig};
use gkit::http::{
    decode_json_request, encode_json_response, populate_request_context, RequestIdLayer, ResponseMetadata,
    Server,
};
use gkit::lifecycle::{serve, shutdown_signal, Shutdown};
use gkit::observability::logging;
use gkit::{Endpoint, Error, RequestContext};

#[derive(Parser)]
#[command(name = "gkit-demo")]
#[command(about = "String service built from gkit endpoints", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

// --- Domain ---

#[derive(Debug, Deserialize)]
struct StringRequest {
    s: String,
}

#[derive(Debug, Serialize)]
struct StringResponse<T> {
    v: T,
}

impl<T> ResponseMetadata for StringResponse<T> {}

#[derive(Debug, Deserialize)]
struct LookupRequest {
    id: u32,
}

#[derive(Debug, Serialize)]
struct LookupResponse {
    id: u32,
    s: String,
}

impl ResponseMetadata for LookupResponse {}

async fn uppercase(_ctx: RequestContext, req: StringRequest) -> Result<StringResponse<String>, Error> {
    if req.s.is_empty() {
        return Err(Error::msg("empty string")
            .with_status(StatusCode::BAD_REQUEST)
            .with_json(&serde_json::json!({ "err": "empty string" })));
    }
    Ok(StringResponse { v: req.s.to_uppercase() })
}

async fn count(_ctx: RequestContext, req: StringRequest) -> Result<StringResponse<usize>, Error> {
    Ok(StringResponse { v: req.s.chars().count() })
}

struct Lookup {
    table: Arc<HashMap<u32, String>>,
}

impl Endpoint<LookupRequest, LookupResponse> for Lookup {
    fn call(&self, _ctx: RequestContext, req: LookupRequest) -> BoxFuture<'static, Result<LookupResponse, Error>> {
        let found = self.table.get(&req.id).cloned();
        Box::pin(async move {
            match found {
                Some(s) => Ok(LookupResponse { id: req.id, s }),
                None => Err(Error::msg(format!("string {} not found", req.id)).with_status(StatusCode::NOT_FOUND)),
            }
        })
    }
}

// --- Wiring ---

fn build_router(config: &AppConfig) -> Router {
    let limit = config.limits.body_bytes;
    let access_log = config.observability.access_log;

    let uppercase = with_access_log(
        Server::builder(uppercase, decode_json_request::<StringRequest>, encode_json_response::<StringResponse<String>>),
        access_log,
    )
    .before(populate_request_context)
    .body_limit(limit)
    .build();

    let count = with_access_log(
        Server::builder(count, decode_json_request::<StringRequest>, encode_json_response::<StringResponse<usize>>),
        access_log,
    )
    .before(populate_request_context)
    .body_limit(limit)
    .build();

    let table: HashMap<u32, String> = [(1, "alpha"), (2, "beta"), (3, "gamma")]
        .into_iter()
        .map(|(id, s)| (id, s.to_string()))
        .collect();
    let lookup = with_access_log(
        Server::builder(
            Lookup { table: Arc::new(table) },
            decode_json_request::<LookupRequest>,
            encode_json_response::<LookupResponse>,
        ),
        access_log,
    )
    .before(populate_request_context)
    .body_limit(limit)
    .build();

    Router::new()
        .route_service("/uppercase", uppercase)
        .route_service("/count", count)
        .route_service("/strings/{id}", lookup)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.timeouts.request_secs),
        ))
        .layer(RequestIdLayer)
        .layer(TraceLayer::new_for_http())
}

fn with_access_log<Req, Res>(
    builder: gkit::http::ServerBuilder<Req, Res>,
    enabled: bool,
) -> gkit::http::ServerBuilder<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    if enabled {
        builder.finalizer(logging::access_log)
    } else {
        builder
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(gkit::config::ConfigError::Validation)?;
    }

    logging::init(&config.observability.log_level)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        body_limit = config.limits.body_bytes,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let router = build_router(&config);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    serve(listener, router, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_binds_path_without_body() {
        let response = build_router(&AppConfig::default())
            .oneshot(Request::builder().uri("/strings/2").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"id":2,"s":"beta"}"#);
    }

    #[tokio::test]
    async fn test_lookup_unknown_id() {
        let response = build_router(&AppConfig::default())
            .oneshot(Request::builder().uri("/strings/9").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_every_route_honours_body_limit() {
        let mut config = AppConfig::default();
        config.limits.body_bytes = 8;
        let body = r#"{"s":"far too long for the limit"}"#;

        for (method, uri) in [(Method::POST, "/uppercase"), (Method::POST, "/count"), (Method::GET, "/strings/1")] {
            let request = Request::builder().method(method).uri(uri).body(Body::from(body)).unwrap();
            let response = build_router(&config).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE, "{uri}");
        }
    }
}
