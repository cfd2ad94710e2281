//! Proxy Configuration Types
//!
//! Data types describing an outbound proxy for the API client. The HTTP client
//! factory that consumes them lives in the `suluk-api` crate.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Proxy protocol type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    /// Return the URL scheme string for this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }

    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(ProxyProtocol::Http),
            "https" => Some(ProxyProtocol::Https),
            "socks5" => Some(ProxyProtocol::Socks5),
            _ => None,
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Only held in memory; never written to config.json.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Build the proxy URL string (without auth).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    /// Parse a proxy URL of the form `scheme://[user[:password]@]host[:port]`.
    ///
    /// Credentials are percent-decoded. The port may be omitted only for
    /// schemes with a well-known default.
    pub fn parse(input: &str) -> CoreResult<Self> {
        let parsed = url::Url::parse(input.trim())
            .map_err(|e| CoreError::parse(format!("invalid proxy URL {}: {}", input, e)))?;
        let protocol = ProxyProtocol::from_scheme(parsed.scheme()).ok_or_else(|| {
            CoreError::parse(format!("unsupported proxy scheme: {}", parsed.scheme()))
        })?;

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(CoreError::parse(format!("proxy URL has no host: {}", input))),
        };
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| CoreError::parse(format!("proxy URL has no port: {}", input)))?;

        let username = match parsed.username() {
            "" => None,
            raw => Some(decode_component(raw)?),
        };
        let password = parsed.password().map(decode_component).transpose()?;

        Ok(Self {
            protocol,
            host,
            port,
            username,
            password,
        })
    }
}

fn decode_component(raw: &str) -> CoreResult<String> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| CoreError::parse(format!("invalid proxy credentials: {}", e)))
}
