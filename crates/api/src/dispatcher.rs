//! Request Dispatcher
//!
//! The single call surface every feature module uses to reach the records
//! service. The bearer credential is looked up on every call, never cached,
//! so a login or logout is visible to the very next request.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::credentials::CredentialSource;
use crate::error::{ApiError, ApiResult};
use crate::transport::{ApiRequest, ApiResponse, ByteStream, HttpTransport, Method, RequestBody};

pub struct RequestDispatcher {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialSource>,
    timeout: Option<Duration>,
}

impl RequestDispatcher {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            credentials,
            timeout: None,
        }
    }

    /// Timeout for discrete (non-streaming) calls.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        query: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> ApiRequest {
        ApiRequest {
            method,
            base_url: self.base_url.clone(),
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
            bearer_token: self.credentials.current_token(),
            timeout,
        }
    }

    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            authorized = request.bearer_token.is_some(),
            "dispatching request"
        );

        let response = self.transport.execute(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        let status = response.status;
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status, "request rejected by server");
        Err(ApiError::Http { status, body })
    }

    /// Generic call. Non-2xx statuses come back as `ApiError::Http` with the
    /// body already read.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        query: &[(&str, &str)],
    ) -> ApiResult<ApiResponse> {
        let request = self.build(method, path, body, query, self.timeout);
        self.send(request).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        self.request(Method::Get, path, RequestBody::Empty, query)
            .await?
            .json()
            .await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::invalid_response(format!("Failed to encode body: {}", e)))?;
        self.request(Method::Post, path, RequestBody::Json(value), &[])
            .await?
            .json()
            .await
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> ApiResult<T> {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.request(Method::Post, path, RequestBody::Form(fields), &[])
            .await?
            .json()
            .await
    }

    /// `GET` whose body is consumed incrementally. No timeout is applied.
    pub async fn open_stream(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<ByteStream> {
        let request = self.build(Method::Get, path, RequestBody::Empty, query, None);
        Ok(self.send(request).await?.into_byte_stream())
    }
}
