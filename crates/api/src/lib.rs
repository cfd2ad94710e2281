//! Suluk API
//!
//! The HTTP layer of the Suluk client:
//! - `http_client` - reqwest client factory with proxy support
//! - `transport` - the `HttpTransport` seam and its reqwest implementation
//! - `dispatcher` - `RequestDispatcher`, which attaches the bearer credential
//!   to every outbound call
//! - `stream` - byte stream to incrementally decoded text stream
//! - `endpoints` / `types` - paths and wire types of the records service
//! - `error` - the error taxonomy surfaced to callers

pub mod credentials;
pub mod dispatcher;
pub mod endpoints;
pub mod error;
pub mod http_client;
pub mod stream;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use credentials::CredentialSource;
pub use dispatcher::RequestDispatcher;
pub use error::{ApiError, ApiResult, UNEXPECTED_ERROR_MESSAGE};
pub use http_client::build_http_client;
pub use stream::{decode_text_stream, TextStream};
pub use transport::{
    ApiRequest, ApiResponse, ByteStream, HttpTransport, Method, ReqwestTransport, RequestBody,
};
pub use types::*;
