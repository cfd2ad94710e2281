//! Settings Models
//!
//! Client configuration stored in config.json, and the host-based rule that
//! picks the API endpoint.

use serde::{Deserialize, Serialize};
use suluk_core::proxy::ProxyConfig;

/// Host the hosted web client is served from.
pub const PRODUCTION_HOST: &str = "suluk.santrafysh.pro";
/// API endpoint paired with [`PRODUCTION_HOST`].
pub const PRODUCTION_API_URL: &str = "https://api.santrafysh.pro";
/// API endpoint for every other host (local development backend).
pub const LOCAL_API_URL: &str = "http://localhost:8000";

/// Pick the API base URL for the host the client runs on.
pub fn base_url_for_host(host: Option<&str>) -> &'static str {
    match host {
        Some(h) if h.eq_ignore_ascii_case(PRODUCTION_HOST) => PRODUCTION_API_URL,
        _ => LOCAL_API_URL,
    }
}

/// Client configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Explicit API base URL; wins over the host rule when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// Host the client considers itself served from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_host: Option<String>,
    /// Analysis language ("en" or "ar")
    #[serde(default = "default_language")]
    pub language: String,
    /// Narrative model; the first model the server lists when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Timeout for discrete requests. The narrative stream has none.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            origin_host: None,
            language: default_language(),
            default_model: None,
            request_timeout_secs: default_request_timeout_secs(),
            proxy: None,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub api_base_url: Option<String>,
    pub origin_host: Option<String>,
    pub language: Option<String>,
    pub default_model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub proxy: Option<ProxyConfig>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(url) = update.api_base_url {
            self.api_base_url = Some(url);
        }
        if let Some(host) = update.origin_host {
            self.origin_host = Some(host);
        }
        if let Some(language) = update.language {
            self.language = language;
        }
        if let Some(model) = update.default_model {
            self.default_model = Some(model);
        }
        if let Some(timeout) = update.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(proxy) = update.proxy {
            self.proxy = Some(proxy);
        }
    }

    /// The API base URL: explicit override first, then the host rule.
    pub fn resolve_base_url(&self) -> String {
        match self.api_base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => base_url_for_host(self.origin_host.as_deref()).to_string(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.language.trim().is_empty() {
            return Err("language must not be empty".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }

        if let Some(url) = self.api_base_url.as_deref().map(str::trim) {
            if !url.is_empty() {
                let parsed = url::Url::parse(url)
                    .map_err(|e| format!("Invalid api_base_url {}: {}", url, e))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(format!(
                        "Invalid api_base_url {}: scheme must be http or https",
                        url
                    ));
                }
            }
        }

        Ok(())
    }
}
