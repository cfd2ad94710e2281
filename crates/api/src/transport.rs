//! HTTP Transport
//!
//! The seam between the dispatcher and the network. Responses always carry a
//! streaming body; discrete callers collect it, the analysis stream consumes
//! it chunk by chunk.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};
use crate::http_client::build_http_client;
use suluk_core::proxy::ProxyConfig;

/// Response body as a stream of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = ApiResult<Bytes>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` fields, in order.
    Form(Vec<(String, String)>),
}

/// A fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub base_url: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Bearer credential, sent as `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,
    /// `None` for streaming calls, which may stay open indefinitely.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }
}

pub struct ApiResponse {
    pub status: u16,
    body: ByteStream,
}

impl fmt::Debug for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl ApiResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    /// Response with a body that is already fully available.
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self::new(
            status,
            Box::pin(futures_util::stream::iter(vec![Ok::<Bytes, ApiError>(body)])),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Collect the whole body.
    pub async fn bytes(mut self) -> ApiResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    pub async fn text(self) -> ApiResult<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json<T: DeserializeOwned>(self) -> ApiResult<T> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::invalid_response(format!("Failed to parse body: {}", e)))
    }

    pub fn into_byte_stream(self) -> ByteStream {
        self.body
    }
}

/// Executes requests. Implementations must not interpret status codes.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> ApiResult<ApiResponse>;
}

/// Transport backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(proxy: Option<&ProxyConfig>) -> ApiResult<Self> {
        Ok(Self {
            client: build_http_client(proxy)?,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let mut builder = self.client.request(request.method.into(), request.url());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref token) = request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(ref value) => builder.json(value),
            RequestBody::Form(ref fields) => builder.form(fields),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ApiError::stream_read(e.to_string())));

        Ok(ApiResponse::new(status, Box::pin(body)))
    }
}
