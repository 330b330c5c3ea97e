//! Endpoint server: wires an [`Endpoint`] to axum.
//!
//! # Responsibilities
//! - Run the request pipeline: before-hooks, decode, endpoint, after-hooks, encode
//! - Route every failure through the error handler and the error encoder
//! - Run finalizers once the response is written
//! - Satisfy tower's `Service` contract so axum can mount the server
//!
//! # Data Flow
//! ```text
//! axum Router (route_service)
//!     → Server::call (buffer body, capture path params)
//!     → Server::serve
//!         → before hooks → decode → endpoint → after hooks → encode
//!         → on error: error handler → error encoder
//!         → finalizers
//!     → Exchange::into_response
//! ```
//!
//! # Design Decisions
//! - Configuration is fixed at `build()`; the server is an `Arc` and clones
//!   share it across requests and tasks
//! - No stage runs concurrently with another; hooks see the cumulative context
//! - Finalizers are driven by a drop guard, so they run at exit however the
//!   pipeline ends

use std::convert::Infallible;
use std::fmt;
use std::mem;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::Request,
    http::StatusCode,
    response::Response,
};
use futures_util::future::BoxFuture;
use tower::Service;

use crate::context::RequestContext;
use crate::endpoint::{BoxEndpoint, Endpoint};
use crate::error::{Error, ErrorHandler, LogErrorHandler};
use crate::http::codec::default_error_encoder;
use crate::http::exchange::Exchange;

/// Default request body limit, matching axum's.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

pub type DecodeRequestFn<Req> = Arc<dyn Fn(&RequestContext, &Exchange) -> Result<Req, Error> + Send + Sync>;
pub type EncodeResponseFn<Res> = Arc<dyn Fn(&RequestContext, &mut Exchange, Res) -> Result<(), Error> + Send + Sync>;
pub type BeforeRequestFn = Arc<dyn Fn(RequestContext, &mut Exchange) -> RequestContext + Send + Sync>;
pub type AfterResponseFn = Arc<dyn Fn(RequestContext, &mut Exchange, Option<&Error>) -> RequestContext + Send + Sync>;
pub type ErrorEncoderFn = Arc<dyn Fn(&RequestContext, &mut Exchange, &Error) + Send + Sync>;

/// Runs after the response is written. The context carries the response
/// header snapshot and size; the status is passed directly.
pub type FinalizerFn = Arc<dyn Fn(&RequestContext, StatusCode, &Exchange) + Send + Sync>;

struct Inner<Req, Res> {
    endpoint: BoxEndpoint<Req, Res>,
    decode: DecodeRequestFn<Req>,
    encode: EncodeResponseFn<Res>,
    before: Vec<BeforeRequestFn>,
    after: Vec<AfterResponseFn>,
    error_encoder: ErrorEncoderFn,
    error_handler: Arc<dyn ErrorHandler>,
    finalizers: Vec<FinalizerFn>,
    body_limit: usize,
}

/// Wraps an endpoint with its transport functions.
///
/// ```rust,no_run
/// use axum::Router;
/// use gkit::http::{decode_json_request, encode_json_response, populate_request_context, Server};
/// use gkit::{Error, RequestContext};
///
/// async fn uppercase(_ctx: RequestContext, s: String) -> Result<String, Error> {
///     Ok(s.to_uppercase())
/// }
///
/// let server = Server::builder(uppercase, decode_json_request::<String>, encode_json_response::<String>)
///     .before(populate_request_context)
///     .build();
///
/// let app: Router = Router::new().route_service("/uppercase", server);
/// ```
pub struct Server<Req, Res> {
    inner: Arc<Inner<Req, Res>>,
}

impl<Req, Res> Clone for Server<Req, Res> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<Req, Res> fmt::Debug for Server<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("before", &self.inner.before.len())
            .field("after", &self.inner.after.len())
            .field("finalizers", &self.inner.finalizers.len())
            .field("body_limit", &self.inner.body_limit)
            .finish()
    }
}

impl<Req, Res> Server<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Starts a builder from the three mandatory parts.
    pub fn builder<E, D, C>(endpoint: E, decode: D, encode: C) -> ServerBuilder<Req, Res>
    where
        E: Endpoint<Req, Res>,
        D: Fn(&RequestContext, &Exchange) -> Result<Req, Error> + Send + Sync + 'static,
        C: Fn(&RequestContext, &mut Exchange, Res) -> Result<(), Error> + Send + Sync + 'static,
    {
        ServerBuilder {
            inner: Inner {
                endpoint: Arc::new(endpoint),
                decode: Arc::new(decode),
                encode: Arc::new(encode),
                before: Vec::new(),
                after: Vec::new(),
                error_encoder: Arc::new(default_error_encoder),
                error_handler: Arc::new(LogErrorHandler::new()),
                finalizers: Vec::new(),
                body_limit: DEFAULT_BODY_LIMIT,
            },
        }
    }

    /// Builds a server with default options.
    pub fn new<E, D, C>(endpoint: E, decode: D, encode: C) -> Self
    where
        E: Endpoint<Req, Res>,
        D: Fn(&RequestContext, &Exchange) -> Result<Req, Error> + Send + Sync + 'static,
        C: Fn(&RequestContext, &mut Exchange, Res) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self::builder(endpoint, decode, encode).build()
    }

    /// Handles one exchange.
    ///
    /// Returns the error that failed the pipeline, after it has been reported
    /// and written to the exchange. Finalizers run when this future completes,
    /// and also when it is dropped early or a stage panics. In the latter
    /// cases they see whatever the exchange holds at that point.
    pub async fn serve(&self, exchange: &mut Exchange) -> Result<(), Error> {
        let mut guard = Finalize {
            finalizers: &self.inner.finalizers,
            ctx: RequestContext::new(),
            exchange,
        };
        let result = self.run(&mut guard.ctx, &mut *guard.exchange).await;
        drop(guard);
        result
    }

    async fn run(&self, ctx: &mut RequestContext, exchange: &mut Exchange) -> Result<(), Error> {
        let inner = &*self.inner;

        for before in &inner.before {
            *ctx = before(mem::take(ctx), exchange);
        }

        let request = match (inner.decode)(&*ctx, exchange) {
            Ok(request) => request,
            Err(err) => return self.fail(ctx, exchange, err),
        };

        let response = match inner.endpoint.call(ctx.clone(), request).await {
            Ok(response) => response,
            Err(err) => return self.fail(ctx, exchange, err),
        };

        for after in &inner.after {
            *ctx = after(mem::take(ctx), exchange, None);
        }

        if let Err(err) = (inner.encode)(&*ctx, exchange, response) {
            return self.fail(ctx, exchange, err);
        }

        Ok(())
    }

    fn fail(&self, ctx: &RequestContext, exchange: &mut Exchange, err: Error) -> Result<(), Error> {
        self.inner.error_handler.handle(ctx, &err);
        (self.inner.error_encoder)(ctx, exchange, &err);
        Err(err)
    }

    /// Buffers an axum request, serves it and materializes the response.
    pub fn handle(&self, request: Request) -> impl Future<Output = Response> + Send + 'static {
        let server = self.clone();
        async move {
            let mut exchange = Exchange::read(request, server.inner.body_limit).await;
            if let Err(err) = server.serve(&mut exchange).await {
                tracing::debug!(
                    status = exchange.status().as_u16(),
                    error = %err,
                    "Endpoint pipeline returned an error"
                );
            }
            exchange.into_response()
        }
    }
}

impl<Req, Res> Service<Request> for Server<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let response = self.handle(request);
        Box::pin(async move { Ok(response.await) })
    }
}

/// Runs the finalizers when dropped, so they also run on unwind and
/// cancellation.
struct Finalize<'a> {
    finalizers: &'a [FinalizerFn],
    ctx: RequestContext,
    exchange: &'a mut Exchange,
}

impl Drop for Finalize<'_> {
    fn drop(&mut self) {
        if self.finalizers.is_empty() {
            return;
        }
        let headers = self.exchange.response_headers().clone();
        let ctx = mem::take(&mut self.ctx).with_response(headers, self.exchange.size());
        let status = self.exchange.status();
        for finalize in self.finalizers {
            finalize(&ctx, status, &*self.exchange);
        }
    }
}

// --- Builder ---

/// Collects the optional parts of a [`Server`].
pub struct ServerBuilder<Req, Res> {
    inner: Inner<Req, Res>,
}

impl<Req, Res> ServerBuilder<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Appends a hook run before the request is decoded.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestContext, &mut Exchange) -> RequestContext + Send + Sync + 'static,
    {
        self.inner.before.push(Arc::new(hook));
        self
    }

    /// Appends a hook run after the endpoint succeeds, before encoding.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestContext, &mut Exchange, Option<&Error>) -> RequestContext + Send + Sync + 'static,
    {
        self.inner.after.push(Arc::new(hook));
        self
    }

    /// Replaces [`default_error_encoder`].
    pub fn error_encoder<F>(mut self, encoder: F) -> Self
    where
        F: Fn(&RequestContext, &mut Exchange, &Error) + Send + Sync + 'static,
    {
        self.inner.error_encoder = Arc::new(encoder);
        self
    }

    /// Replaces [`LogErrorHandler`].
    pub fn error_handler(mut self, handler: impl ErrorHandler) -> Self {
        self.inner.error_handler = Arc::new(handler);
        self
    }

    /// Appends a finalizer.
    pub fn finalizer<F>(mut self, finalizer: F) -> Self
    where
        F: Fn(&RequestContext, StatusCode, &Exchange) + Send + Sync + 'static,
    {
        self.inner.finalizers.push(Arc::new(finalizer));
        self
    }

    /// Maximum number of request body bytes buffered by [`Server::handle`].
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.inner.body_limit = limit;
        self
    }

    pub fn build(self) -> Server<Req, Res> {
        Server { inner: Arc::new(self.inner) }
    }
}
