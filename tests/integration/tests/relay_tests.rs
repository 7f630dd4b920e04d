//! Relay Integration Tests
//!
//! Each test runs a relay over its own temporary message log.
//!
//! Run with: cargo test -p integration-tests --test relay_tests

use std::collections::BTreeMap;
use std::time::Duration;

use futures_util::StreamExt;
use integration_tests::{assert_json, assert_status, test_invites as fixture_invites, MessageLine, TestRelay};
use reqwest::StatusCode;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message as WsMessage;

// ============================================================================
// HTTP Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let relay = TestRelay::start(fixture_invites()).await.expect("Failed to start relay");
    let response = relay.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_invites() {
    let relay = TestRelay::start(fixture_invites()).await.expect("Failed to start relay");
    let response = relay.get("/invites").await.unwrap();
    let invites: BTreeMap<String, String> = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(invites.len(), 2);
    assert_eq!(invites["EleutherAI"], "https://discord.gg/zBGx3azzUn");
}

#[tokio::test]
async fn test_recents_holds_backlog_oldest_first() {
    let backlog = vec![
        MessageLine::new("EleutherAI", "first"),
        MessageLine::new("Mathematics", "second"),
    ];
    let mut lines: Vec<String> = backlog.iter().map(MessageLine::line).collect();
    lines.insert(1, "not a message".to_string());

    let relay = TestRelay::start_with_backlog(fixture_invites(), &lines)
        .await
        .expect("Failed to start relay");

    let response = relay.get("/recents").await.unwrap();
    let recents: Vec<Value> = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(recents.len(), 2);
    assert_eq!(recents[0]["id"], backlog[0].id());
    assert_eq!(recents[1]["content"], "second");
}

#[tokio::test]
async fn test_unknown_route_returns_error_body() {
    let relay = TestRelay::start(fixture_invites()).await.expect("Failed to start relay");
    let response = relay.get("/nope").await.unwrap();
    let body: Value = assert_json(response, StatusCode::NOT_FOUND).await.unwrap();

    assert_eq!(body["code"], "NOT_FOUND");
}

// ============================================================================
// Subscription Tests
// ============================================================================

#[tokio::test]
async fn test_subscriber_receives_appended_lines() {
    let relay = TestRelay::start(fixture_invites()).await.expect("Failed to start relay");

    let url = format!("ws://{}/subscribe", relay.addr);
    let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .expect("Failed to connect");
    relay.wait_until(|hub| hub.subscriber_count() == 1).await.unwrap();

    let message = MessageLine::new("EleutherAI", "live");
    relay.append("{ broken").unwrap();
    relay.append(&message.line()).unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("Timed out waiting for frame")
        .expect("Socket closed")
        .expect("Socket error");

    match frame {
        WsMessage::Text(text) => assert_eq!(text, message.line()),
        other => panic!("Unexpected frame: {other:?}"),
    }

    // live lines also land in the recent window
    relay.wait_until(|hub| hub.recents().len() == 1).await.unwrap();

    socket.close(None).await.ok();
    relay.wait_until(|hub| hub.subscriber_count() == 0).await.unwrap();
}
