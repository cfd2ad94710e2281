//! Settings Commands
//!
//! Read and change config.json. These work without a session or network.

use std::path::Path;

use suluk_core::ProxyConfig;

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::storage::config::ConfigService;
use crate::utils::error::AppResult;

pub fn get_settings(config_dir: &Path) -> AppResult<AppConfig> {
    Ok(ConfigService::new(config_dir)?.get_config().clone())
}

pub fn update_settings(config_dir: &Path, update: SettingsUpdate) -> AppResult<AppConfig> {
    ConfigService::new(config_dir)?.update_config(update)
}

pub fn reset_settings(config_dir: &Path) -> AppResult<AppConfig> {
    let mut service = ConfigService::new(config_dir)?;
    service.reset()?;
    Ok(service.get_config().clone())
}

/// Parse `scheme://[user[:password]@]host:port` for `SettingsUpdate::proxy`.
pub fn parse_proxy(url: &str) -> AppResult<ProxyConfig> {
    Ok(ProxyConfig::parse(url)?)
}
