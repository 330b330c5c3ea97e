//! The transport-agnostic business function.
//!
//! An endpoint knows nothing about HTTP. It takes the request context and a
//! typed request and resolves to a typed response or an [`Error`]:
//!
//! ```text
//! async fn uppercase(ctx: RequestContext, req: UppercaseRequest) -> Result<UppercaseResponse, Error>
//! ```
//!
//! Any `Fn(RequestContext, Req) -> impl Future<Output = Result<Res, Error>>`
//! is an [`Endpoint`]. Structs holding service state implement the trait
//! directly.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::context::RequestContext;
use crate::error::Error;

/// Business logic contract.
pub trait Endpoint<Req, Res>: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext, request: Req) -> BoxFuture<'static, Result<Res, Error>>;
}

impl<F, Fut, Req, Res> Endpoint<Req, Res> for F
where
    F: Fn(RequestContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, Error>> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, request: Req) -> BoxFuture<'static, Result<Res, Error>> {
        Box::pin(self(ctx, request))
    }
}

/// Shared, type-erased endpoint.
pub type BoxEndpoint<Req, Res> = Arc<dyn Endpoint<Req, Res>>;

/// An endpoint that ignores its request and returns the default response.
pub async fn nop_endpoint<Req, Res: Default>(_ctx: RequestContext, _request: Req) -> Result<Res, Error> {
    Ok(Res::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Adder {
        base: i64,
    }

    impl Endpoint<i64, i64> for Adder {
        fn call(&self, _ctx: RequestContext, request: i64) -> BoxFuture<'static, Result<i64, Error>> {
            let base = self.base;
            Box::pin(async move { Ok(base + request) })
        }
    }

    #[tokio::test]
    async fn test_closure_endpoint() {
        let endpoint = |_ctx: RequestContext, s: String| async move { Ok::<_, Error>(s.len()) };
        let n = Endpoint::call(&endpoint, RequestContext::new(), "hello".to_string())
            .await
            .unwrap();
        assert_eq!(n, 5);
    }

    #[tokio::test]
    async fn test_struct_endpoint() {
        let endpoint: BoxEndpoint<i64, i64> = Arc::new(Adder { base: 40 });
        assert_eq!(endpoint.call(RequestContext::new(), 2).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_nop_endpoint() {
        let res: String = nop_endpoint(RequestContext::new(), 1u8).await.unwrap();
        assert!(res.is_empty());
    }
}
