//! Auth Commands

use suluk_api::types::Identity;

use crate::models::session::SessionState;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Log in and return the confirmed identity.
pub async fn login(state: &AppState, username: &str, password: &str) -> AppResult<Identity> {
    match state.login(username, password).await? {
        SessionState::Authenticated { identity } => Ok(identity),
        // The token was issued but the identity behind it was not confirmed.
        _ => Err(AppError::NotAuthenticated),
    }
}

pub async fn register(state: &AppState, username: &str, password: &str) -> AppResult<()> {
    state.register(username, password).await?;
    Ok(())
}

pub fn logout(state: &AppState) -> AppResult<()> {
    state.logout()
}

pub async fn whoami(state: &AppState) -> AppResult<Identity> {
    state.require_session().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::AppConfig;
    use crate::storage::credentials::MemoryCredentialStore;
    use serde_json::json;
    use std::sync::Arc;
    use suluk_api::testing::ScriptedTransport;
    use suluk_api::Method;

    #[tokio::test]
    async fn test_login_then_whoami_then_logout() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(Method::Post, "/token", 200, json!({"access_token": "abc"}));
        transport.respond_json(
            Method::Get,
            "/users/me",
            200,
            json!({"id": 3, "username": "layla", "created_at": "2024-01-01T00:00:00"}),
        );
        let state = AppState::with_parts(
            AppConfig::default(),
            transport.clone(),
            Arc::new(MemoryCredentialStore::new()),
        )
        .await;

        assert_eq!(login(&state, "layla", "pw").await.unwrap().id, 3);
        assert_eq!(whoami(&state).await.unwrap().username, "layla");

        logout(&state).unwrap();
        logout(&state).unwrap();
        assert!(matches!(whoami(&state).await, Err(AppError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_unconfirmed_identity_is_not_logged_in() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(Method::Post, "/token", 200, json!({"access_token": "abc"}));
        transport.respond_json(Method::Get, "/users/me", 500, json!({"detail": "db down"}));
        let state = AppState::with_parts(
            AppConfig::default(),
            transport,
            Arc::new(MemoryCredentialStore::new()),
        )
        .await;

        assert!(matches!(
            login(&state, "layla", "pw").await,
            Err(AppError::NotAuthenticated)
        ));
    }
}
