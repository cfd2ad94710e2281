//! Session Models

use serde::{Deserialize, Serialize};
use suluk_api::types::Identity;

/// Authentication state published by the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    /// A stored token is being checked against the identity endpoint.
    Resolving,
    Authenticated { identity: Identity },
    Unauthenticated,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated { identity } => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, SessionState::Resolving)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Resolving => write!(f, "resolving"),
            SessionState::Authenticated { identity } => {
                write!(f, "authenticated as {}", identity.username)
            }
            SessionState::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}
