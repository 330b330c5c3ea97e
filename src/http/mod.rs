//! HTTP transport for endpoints, hosted by axum.
//!
//! # Data Flow
//! ```text
//! axum Router
//!     → request.rs (assign/propagate x-request-id)
//!     → server.rs (Server: tower Service wrapping one endpoint)
//!         → exchange.rs (buffered request, response being written)
//!         → bind.rs (path params + query + JSON body → request type)
//!         → hooks.rs (before-hooks populating the context)
//!         → codec.rs (JSON decode/encode, default error encoder)
//!     → axum Response
//! ```

mod bind;
pub mod codec;
pub mod exchange;
pub mod hooks;
pub mod request;
pub mod server;

pub use codec::{decode_json_request, default_error_encoder, encode_json_response, ResponseMetadata};
pub use exchange::Exchange;
pub use hooks::{populate_request_context, set_content_type, set_request_header, set_response_header, X_REQUEST_ID};
pub use request::RequestIdLayer;
pub use server::{
    AfterResponseFn, BeforeRequestFn, DecodeRequestFn, EncodeResponseFn, ErrorEncoderFn, FinalizerFn, Server,
    ServerBuilder, DEFAULT_BODY_LIMIT,
};
