//! Analysis Flow Integration Tests
//!
//! Tests the analysis orchestrator through the wired `AppState`:
//! - Structured figures published first, narrative appended per increment
//! - Multi-byte text split across chunks
//! - A newer run replacing one that is still streaming
//! - Logout abandoning a run mid-stream

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;

use suluk_api::testing::ScriptedTransport;
use suluk_api::Method;
use suluk_client::commands;
use suluk_client::{AppConfig, AppState, MemoryCredentialStore, StreamOutcome};

// ============================================================================
// Helpers
// ============================================================================

async fn logged_in_state(transport: &Arc<ScriptedTransport>) -> AppState {
    transport.respond_json(
        Method::Get,
        "/users/me",
        200,
        json!({"id": 1, "username": "noor", "created_at": "2024-01-01T00:00:00"}),
    );
    AppState::with_parts(
        AppConfig::default(),
        transport.clone(),
        Arc::new(MemoryCredentialStore::with_token("tok")),
    )
    .await
}

fn summary(name: &str, total: f64) -> serde_json::Value {
    json!({
        "client_name": name,
        "total_spent": total,
        "purchase_count": 4,
        "chart_data": [
            {"date": "2024-01-03", "amount": 25.0},
            {"date": "2024-02-11", "amount": 75.0}
        ],
        "top_items": [{"name": "Cardamom", "value": 6.0}, {"name": "Saffron", "value": 2.0}]
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_narrative_grows_over_fixed_figures() {
    let transport = Arc::new(ScriptedTransport::new());
    let state = logged_in_state(&transport).await;
    transport.respond_json(Method::Get, "/analysis/3", 200, summary("Acme", 100.0));
    transport.respond_chunks(
        Method::Get,
        "/analysis/3/stream",
        vec![Ok(Bytes::from_static(b"Hi ")), Ok(Bytes::from_static(b"there"))],
    );

    let mut run = commands::start_analysis(&state, 3, None, Some("llama3".to_string()))
        .await
        .unwrap();
    let mut snapshots = Vec::new();
    while let Some(snapshot) = run.next_update().await {
        snapshots.push(snapshot);
    }

    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].narrative, "");
    assert_eq!(snapshots[1].narrative, "Hi ");
    assert_eq!(snapshots[2].narrative, "Hi there");
    for snapshot in &snapshots {
        assert_eq!(snapshot.total_spent, 100.0);
        assert_eq!(snapshot.top_items.len(), 2);
        assert_eq!(snapshot.chart_series[1].amount, 75.0);
    }
    assert_eq!(run.finish().await, StreamOutcome::Completed);

    let stream_request = &transport.requests()[2];
    assert_eq!(stream_request.path, "/analysis/3/stream");
    assert_eq!(stream_request.bearer_token.as_deref(), Some("tok"));
    assert!(stream_request.timeout.is_none());
}

#[tokio::test]
async fn test_split_multibyte_narrative() {
    let transport = Arc::new(ScriptedTransport::new());
    let state = logged_in_state(&transport).await;
    transport.respond_json(Method::Get, "/analysis/3", 200, summary("Acme", 1.0));
    let bytes = "héllo مرحبا".as_bytes();
    transport.respond_chunks(
        Method::Get,
        "/analysis/3/stream",
        vec![
            Ok(Bytes::copy_from_slice(&bytes[..2])),
            Ok(Bytes::copy_from_slice(&bytes[2..8])),
            Ok(Bytes::copy_from_slice(&bytes[8..])),
        ],
    );

    let run = commands::start_analysis(&state, 3, Some("ar".to_string()), Some("m".to_string()))
        .await
        .unwrap();
    assert_eq!(run.finish().await, StreamOutcome::Completed);

    let view = state.orchestrator().current().unwrap();
    assert_eq!(view.result.narrative, "héllo مرحبا");
    assert!(!view.result.narrative.contains('\u{FFFD}'));
}

#[tokio::test]
async fn test_newer_run_replaces_streaming_run() {
    let transport = Arc::new(ScriptedTransport::new());
    let state = logged_in_state(&transport).await;
    transport.respond_json(Method::Get, "/analysis/1", 200, summary("Alpha", 10.0));
    let feed_a = transport.respond_live(Method::Get, "/analysis/1/stream");
    transport.respond_json(Method::Get, "/analysis/2", 200, summary("Beta", 20.0));
    transport.respond_chunks(
        Method::Get,
        "/analysis/2/stream",
        vec![Ok(Bytes::from_static(b"Beta narrative"))],
    );

    let mut run_a = commands::start_analysis(&state, 1, None, Some("m".to_string()))
        .await
        .unwrap();
    run_a.next_update().await.unwrap();
    feed_a.send_text("Alpha part one. ");
    assert_eq!(run_a.next_update().await.unwrap().narrative, "Alpha part one. ");

    let run_b = commands::start_analysis(&state, 2, None, Some("m".to_string()))
        .await
        .unwrap();
    feed_a.send_text("Alpha part two.");

    assert_eq!(run_b.finish().await, StreamOutcome::Completed);
    assert_eq!(run_a.finish().await, StreamOutcome::Superseded);

    let view = state.orchestrator().current().unwrap();
    assert_eq!(view.result.client_name, "Beta");
    assert_eq!(view.result.total_spent, 20.0);
    assert_eq!(view.result.narrative, "Beta narrative");
}

#[tokio::test]
async fn test_logout_abandons_stream() {
    let transport = Arc::new(ScriptedTransport::new());
    let state = logged_in_state(&transport).await;
    transport.respond_json(Method::Get, "/analysis/1", 200, summary("Alpha", 10.0));
    let feed = transport.respond_live(Method::Get, "/analysis/1/stream");

    let mut run = commands::start_analysis(&state, 1, None, Some("m".to_string()))
        .await
        .unwrap();
    run.next_update().await.unwrap();

    state.logout().unwrap();
    feed.send_text("should not appear");

    assert!(run.next_update().await.is_none());
    assert_eq!(run.finish().await, StreamOutcome::Superseded);
    assert!(state.orchestrator().current().is_none());
}

#[tokio::test]
async fn test_structured_failure_then_retry() {
    let transport = Arc::new(ScriptedTransport::new());
    let state = logged_in_state(&transport).await;
    transport.fail(Method::Get, "/analysis/1", "connection refused");
    transport.respond_json(Method::Get, "/analysis/1", 200, summary("Alpha", 10.0));
    transport.respond_chunks(Method::Get, "/analysis/1/stream", vec![]);

    assert!(commands::start_analysis(&state, 1, None, Some("m".to_string()))
        .await
        .is_err());
    assert!(state.orchestrator().current().is_none());
    assert_eq!(transport.count(Method::Get, "/analysis/1/stream"), 0);

    let run = commands::start_analysis(&state, 1, None, Some("m".to_string()))
        .await
        .unwrap();
    assert_eq!(run.finish().await, StreamOutcome::Completed);
    assert_eq!(state.orchestrator().current().unwrap().result.client_name, "Alpha");
}
