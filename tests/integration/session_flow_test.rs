//! Session Flow Integration Tests
//!
//! Tests the credential store, session manager, auth flows and route guard
//! together:
//! - Token persistence across restarts with one identity fetch per start
//! - Self-healing of a rejected stored token
//! - Login failure paths, told apart only by the calls made
//! - Route guard decisions following session publications

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use suluk_api::testing::ScriptedTransport;
use suluk_api::Method;
use suluk_client::storage::credentials::{CredentialStore, FileCredentialStore};
use suluk_client::utils::paths::credentials_path;
use suluk_client::{AppConfig, AppError, AppState, RouteDecision, SessionState};

// ============================================================================
// Helpers
// ============================================================================

fn identity(username: &str) -> serde_json::Value {
    json!({"id": 11, "username": username, "created_at": "2024-05-01T10:00:00.123456"})
}

async fn start(dir: &Path, transport: &Arc<ScriptedTransport>) -> AppState {
    AppState::with_transport(AppConfig::default(), dir, transport.clone()).await
}

fn stored_token(dir: &Path) -> Option<String> {
    FileCredentialStore::open(credentials_path(dir), "http://localhost:8000").read()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_fresh_install_is_logged_out_without_network() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new());

    let state = start(temp.path(), &transport).await;
    assert_eq!(state.session().state(), SessionState::Unauthenticated);
    assert_eq!(state.route_guard().current(), RouteDecision::RedirectToLogin);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_login_survives_restart_with_single_identity_fetch() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new());
    transport.respond_json(Method::Post, "/token", 200, json!({"access_token": "tok-A", "token_type": "bearer"}));
    transport.respond_json(Method::Get, "/users/me", 200, identity("noor"));

    let state = start(temp.path(), &transport).await;
    state.login("noor", "secret").await.unwrap();
    assert_eq!(stored_token(temp.path()).as_deref(), Some("tok-A"));
    drop(state);

    transport.respond_json(Method::Get, "/users/me", 200, identity("noor"));
    let before = transport.count(Method::Get, "/users/me");
    let restarted = start(temp.path(), &transport).await;

    assert_eq!(transport.count(Method::Get, "/users/me") - before, 1);
    assert_eq!(restarted.route_guard().current(), RouteDecision::RenderChildren);
    let identity = restarted.require_session().await.unwrap();
    assert_eq!(identity.username, "noor");
    assert!(identity.created_at_utc().is_some());
}

#[tokio::test]
async fn test_rejected_stored_token_is_dropped_on_start() {
    let temp = TempDir::new().unwrap();
    FileCredentialStore::open(credentials_path(temp.path()), "http://localhost:8000")
        .save("expired")
        .unwrap();
    let transport = Arc::new(ScriptedTransport::new());
    transport.respond_json(Method::Get, "/users/me", 401, json!({"detail": "Could not validate credentials"}));

    let state = start(temp.path(), &transport).await;
    assert_eq!(state.session().state(), SessionState::Unauthenticated);
    assert_eq!(transport.count(Method::Get, "/users/me"), 1);
    assert_eq!(transport.requests()[0].bearer_token.as_deref(), Some("expired"));
    assert!(stored_token(temp.path()).is_none());
}

#[tokio::test]
async fn test_login_failures_differ_only_in_calls_made() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new());
    let state = start(temp.path(), &transport).await;

    transport.respond_json(Method::Post, "/token", 401, json!({"detail": "Incorrect username or password"}));
    let err = state.login("noor", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Incorrect username or password");
    assert_eq!(state.session().state(), SessionState::Unauthenticated);
    assert_eq!(transport.requests().len(), 1);

    transport.respond_json(Method::Post, "/token", 200, json!({"access_token": "tok-B"}));
    transport.fail(Method::Get, "/users/me", "connection reset");
    let settled = state.login("noor", "secret").await.unwrap();
    assert_eq!(settled, SessionState::Unauthenticated);
    assert_eq!(transport.requests().len(), 3);
    assert!(stored_token(temp.path()).is_none());
}

#[tokio::test]
async fn test_route_guard_follows_login_and_logout() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new());
    transport.respond_json(Method::Post, "/token", 200, json!({"access_token": "tok-C"}));
    transport.respond_json(Method::Get, "/users/me", 200, identity("layla"));

    let state = start(temp.path(), &transport).await;
    let mut guard = state.route_guard();
    assert_eq!(guard.current(), RouteDecision::RedirectToLogin);

    state.login("layla", "pw").await.unwrap();
    assert_eq!(guard.changed().await, Some(RouteDecision::RenderChildren));

    state.logout().unwrap();
    assert_eq!(guard.changed().await, Some(RouteDecision::RedirectToLogin));
    assert!(matches!(state.require_session().await, Err(AppError::NotAuthenticated)));

    state.logout().unwrap();
    assert!(stored_token(temp.path()).is_none());
    assert_eq!(transport.count(Method::Get, "/users/me"), 1);
}

#[tokio::test]
async fn test_tokens_are_scoped_per_backend() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new());
    transport.respond_json(Method::Post, "/token", 200, json!({"access_token": "local-token"}));
    transport.respond_json(Method::Get, "/users/me", 200, identity("noor"));
    start(temp.path(), &transport).await.login("noor", "pw").await.unwrap();

    let production = AppConfig {
        origin_host: Some("suluk.santrafysh.pro".to_string()),
        ..Default::default()
    };
    let before = transport.requests().len();
    let state = AppState::with_transport(production, temp.path(), transport.clone()).await;

    assert_eq!(state.base_url(), "https://api.santrafysh.pro");
    assert_eq!(state.session().state(), SessionState::Unauthenticated);
    assert_eq!(transport.requests().len(), before);
    assert_eq!(stored_token(temp.path()).as_deref(), Some("local-token"));
}
