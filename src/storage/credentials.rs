//! Credential Store
//!
//! Durable storage of the one bearer token the client holds. Tokens are
//! scoped to the API origin they were issued by, so pointing the client at a
//! different backend never sends it a foreign token.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use suluk_api::CredentialSource;

use crate::utils::error::{AppError, AppResult};

/// Fixed key the token is stored under within an origin's entry.
pub const TOKEN_KEY: &str = "token";

/// Writable credential storage.
///
/// Only the session manager holds this handle; everything else sees the
/// store through [`CredentialSource`].
pub trait CredentialStore: CredentialSource {
    /// Store `token`, replacing any previous one.
    fn save(&self, token: &str) -> AppResult<()>;

    fn read(&self) -> Option<String>;

    /// Remove the token. Clearing an empty store succeeds.
    fn clear(&self) -> AppResult<()>;
}

/// `scheme://host:port` of `base_url`, or the trimmed URL itself when it
/// does not parse.
pub fn origin_of(base_url: &str) -> String {
    match url::Url::parse(base_url) {
        Ok(url) => url.origin().ascii_serialization(),
        Err(_) => base_url.trim_end_matches('/').to_string(),
    }
}

type Entries = BTreeMap<String, BTreeMap<String, String>>;

/// Token store backed by `credentials.json`.
///
/// The file maps each API origin to its stored values. Reads come from an
/// in-memory mirror; every write goes through to disk.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    origin: String,
    entries: RwLock<Entries>,
}

impl FileCredentialStore {
    /// Open the store at `path` for the API served at `base_url`.
    ///
    /// A missing file is an empty store. So is an unreadable or corrupt one,
    /// which is logged and overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>, base_url: &str) -> Self {
        let path = path.into();
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable credential file");
                Entries::new()
            }
        };

        Self {
            path,
            origin: origin_of(base_url),
            entries: RwLock::new(entries),
        }
    }

    fn load(path: &Path) -> AppResult<Entries> {
        if !path.exists() {
            return Ok(Entries::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, entries: &Entries) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            crate::utils::paths::ensure_dir(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, token: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AppError::storage("credential store lock poisoned"))?;
        entries
            .entry(self.origin.clone())
            .or_default()
            .insert(TOKEN_KEY.to_string(), token.to_string());
        self.persist(&entries)
    }

    fn read(&self) -> Option<String> {
        let entries = self.entries.read().ok()?;
        entries
            .get(&self.origin)
            .and_then(|values| values.get(TOKEN_KEY))
            .cloned()
    }

    fn clear(&self) -> AppResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AppError::storage("credential store lock poisoned"))?;
        let removed = match entries.get_mut(&self.origin) {
            Some(values) => {
                let removed = values.remove(TOKEN_KEY).is_some();
                if values.is_empty() {
                    entries.remove(&self.origin);
                }
                removed
            }
            None => false,
        };
        if removed || self.path.exists() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

impl CredentialSource for FileCredentialStore {
    fn current_token(&self) -> Option<String> {
        self.read()
    }
}

/// Non-durable token store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, token: &str) -> AppResult<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| AppError::storage("credential store lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn read(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    fn clear(&self) -> AppResult<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| AppError::storage("credential store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

impl CredentialSource for MemoryCredentialStore {
    fn current_token(&self) -> Option<String> {
        self.read()
    }
}
