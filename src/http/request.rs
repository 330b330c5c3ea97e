//! Request id assignment and propagation.
//!
//! # Responsibilities
//! - Assign a UUID v4 `x-request-id` to requests arriving without one
//! - Echo the request id on the response
//!
//! # Design Decisions
//! - Added as early as possible so hooks and logs always see an id
//! - An id supplied by the client or an upstream proxy is kept as-is

use tower::Layer;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestId, PropagateRequestIdLayer, SetRequestId, SetRequestIdLayer,
};

pub use crate::http::hooks::X_REQUEST_ID;

/// Sets `x-request-id` when absent and copies it onto the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = SetRequestId<PropagateRequestId<S>, MakeRequestUuid>;

    fn layer(&self, inner: S) -> Self::Service {
        SetRequestIdLayer::x_request_id(MakeRequestUuid)
            .layer(PropagateRequestIdLayer::x_request_id().layer(inner))
    }
}
