//! In-process transport for tests.
//!
//! Responses are scripted per `(method, path)` and consumed in FIFO order.
//! Streaming bodies can be fed live from the test through a [`StreamFeed`].
//! Every executed request is recorded.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::credentials::CredentialSource;
use crate::error::{ApiError, ApiResult};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method};

enum Scripted {
    Body { status: u16, body: Bytes },
    Chunks {
        status: u16,
        chunks: Vec<ApiResult<Bytes>>,
    },
    Live {
        status: u16,
        rx: mpsc::UnboundedReceiver<ApiResult<Bytes>>,
    },
    NetworkFailure(String),
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        if let Ok(mut routes) = self.routes.lock() {
            routes
                .entry((method, path.to_string()))
                .or_default()
                .push_back(scripted);
        }
    }

    pub fn respond_json(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.push(
            method,
            path,
            Scripted::Body {
                status,
                body: Bytes::from(body.to_string()),
            },
        );
    }

    pub fn respond_text(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(
            method,
            path,
            Scripted::Body {
                status,
                body: Bytes::copy_from_slice(body.as_bytes()),
            },
        );
    }

    /// 200 response whose body arrives as the given chunks.
    pub fn respond_chunks(&self, method: Method, path: &str, chunks: Vec<ApiResult<Bytes>>) {
        self.push(method, path, Scripted::Chunks { status: 200, chunks });
    }

    /// 200 response whose body is fed by the returned handle.
    pub fn respond_live(&self, method: Method, path: &str) -> StreamFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.push(method, path, Scripted::Live { status: 200, rx });
        StreamFeed { tx }
    }

    /// No response at all.
    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.push(method, path, Scripted::NetworkFailure(message.to_string()));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let key = (request.method, request.path.clone());
        if let Ok(mut log) = self.log.lock() {
            log.push(request);
        }

        let scripted = self
            .routes
            .lock()
            .ok()
            .and_then(|mut routes| routes.get_mut(&key).and_then(|queue| queue.pop_front()));

        match scripted {
            Some(Scripted::Body { status, body }) => Ok(ApiResponse::from_bytes(status, body)),
            Some(Scripted::Chunks { status, chunks }) => Ok(ApiResponse::new(
                status,
                Box::pin(futures_util::stream::iter(chunks)),
            )),
            Some(Scripted::Live { status, rx }) => {
                let body = futures_util::stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                });
                Ok(ApiResponse::new(status, Box::pin(body)))
            }
            Some(Scripted::NetworkFailure(message)) => Err(ApiError::network(message)),
            None => Ok(ApiResponse::from_bytes(404, r#"{"detail":"Not Found"}"#)),
        }
    }
}

/// Writer side of a live streaming body. Dropping it ends the body.
pub struct StreamFeed {
    tx: mpsc::UnboundedSender<ApiResult<Bytes>>,
}

impl StreamFeed {
    /// Returns `false` once the reader has gone away.
    pub fn send_text(&self, text: &str) -> bool {
        self.send_bytes(text.as_bytes())
    }

    pub fn send_bytes(&self, bytes: &[u8]) -> bool {
        self.tx.send(Ok(Bytes::copy_from_slice(bytes))).is_ok()
    }

    pub fn fail(&self, message: &str) -> bool {
        self.tx.send(Err(ApiError::stream_read(message))).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn close(self) {}
}

/// Credential source with a settable token.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: RwLock<Option<String>>,
}

impl StaticCredentials {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: RwLock::new(token.map(str::to_string)),
        }
    }

    pub fn set(&self, token: Option<&str>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token.map(str::to_string);
        }
    }
}

impl CredentialSource for StaticCredentials {
    fn current_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }
}
