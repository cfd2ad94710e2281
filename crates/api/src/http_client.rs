//! HTTP Client Factory
//!
//! Builds the reqwest client used by the transport, with optional proxy.

use suluk_core::proxy::ProxyConfig;

use crate::error::{ApiError, ApiResult};

/// Build a `reqwest::Client` with the resolved proxy configuration.
///
/// - `Some(proxy)` -> route every request through the proxy
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
///
/// No client-wide timeout is set: the streaming analysis call must be able to
/// stay open as long as the server keeps writing. Per-request timeouts are
/// applied by the transport instead.
pub fn build_http_client(proxy: Option<&ProxyConfig>) -> ApiResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    match proxy {
        Some(cfg) => {
            let mut p = reqwest::Proxy::all(cfg.url())
                .map_err(|e| ApiError::network(format!("Invalid proxy {}: {}", cfg.url(), e)))?;
            if let Some(u) = &cfg.username {
                p = p.basic_auth(u, cfg.password.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(p);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder
        .build()
        .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use suluk_core::proxy::ProxyProtocol;

    #[test]
    fn test_build_http_client_no_proxy() {
        assert!(build_http_client(None).is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let cfg = ProxyConfig {
            protocol: ProxyProtocol::Http,
            host: "127.0.0.1".to_string(),
            port: 8080,
            username: Some("user".to_string()),
            password: Some("pw".to_string()),
        };
        assert!(build_http_client(Some(&cfg)).is_ok());
    }

    #[test]
    fn test_build_http_client_with_username_only() {
        let cfg = ProxyConfig::parse("socks5://user@127.0.0.1:1080").unwrap();
        assert!(build_http_client(Some(&cfg)).is_ok());
    }
}
