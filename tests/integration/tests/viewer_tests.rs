//! Viewer Integration Tests
//!
//! Drives the viewer's client and controller against a live relay.
//!
//! Run with: cargo test -p integration-tests --test viewer_tests

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use feed_cache::{FeedStore, FeedStoreConfig, MemoryStore};
use feed_render::MessageRenderer;
use feed_viewer::{
    connect, subscribe_url, ConnectionState, FeedApi, FeedController, HttpFeedApi,
    SubscriptionEvent,
};
use futures_util::{Stream, StreamExt};
use integration_tests::{test_invites, MessageLine, TestRelay};
use url::Url;

fn controller() -> FeedController<Arc<MemoryStore>> {
    let store = FeedStore::new(Arc::new(MemoryStore::new()), FeedStoreConfig::default());
    FeedController::new(MessageRenderer::default(), store)
}

async fn next_event<S>(events: &mut std::pin::Pin<&mut S>) -> SubscriptionEvent
where
    S: Stream<Item = SubscriptionEvent>,
{
    tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .expect("Timed out waiting for event")
        .expect("Event stream ended")
}

// ============================================================================
// Client Tests
// ============================================================================

#[tokio::test]
async fn test_api_fetches_invites_and_recents() {
    let line = MessageLine::new("EleutherAI", "backlog");
    let relay = TestRelay::start_with_backlog(test_invites(), &[line.line()])
        .await
        .expect("Failed to start relay");

    let api = HttpFeedApi::new(&relay.base_url()).unwrap();
    assert_eq!(api.invites().await.unwrap(), test_invites());

    let recents = api.recents().await.unwrap().expect("Relay serves recents");
    assert_eq!(recents.len(), 1);
    assert_eq!(recents[0].id, line.id());
}

#[tokio::test]
async fn test_unreachable_relay_errors() {
    let api = HttpFeedApi::new("http://127.0.0.1:1").unwrap();
    assert!(api.invites().await.is_err());
}

#[tokio::test]
async fn test_subscription_reports_failure() {
    let url = subscribe_url(&Url::parse("http://127.0.0.1:1").unwrap()).unwrap();
    let mut events = pin!(connect(url));

    assert!(matches!(next_event(&mut events).await, SubscriptionEvent::Error(_)));
    assert!(events.next().await.is_none());
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[tokio::test]
async fn test_startup_with_empty_relay() {
    let relay = TestRelay::start(test_invites()).await.expect("Failed to start relay");
    let api = HttpFeedApi::new(&relay.base_url()).unwrap();

    let mut controller = controller();
    controller.start(&api).await;

    assert_eq!(controller.document().message_count(), 0);
    assert_eq!(controller.document().toggle_count(), 2);
    assert_eq!(controller.state(), ConnectionState::Connecting);
}

#[tokio::test]
async fn test_live_message_rendered_and_hidden() {
    let backlog = MessageLine::new("Mathematics", "old news");
    let relay = TestRelay::start_with_backlog(test_invites(), &[backlog.line()])
        .await
        .expect("Failed to start relay");
    let api = HttpFeedApi::new(&relay.base_url()).unwrap();

    let mut controller = controller();
    controller.start(&api).await;
    assert_eq!(controller.document().message_count(), 1);

    let mut events = pin!(connect(subscribe_url(api.base()).unwrap()));
    let opened = next_event(&mut events).await;
    assert_eq!(opened, SubscriptionEvent::Opened);
    controller.handle_event(opened);
    assert_eq!(controller.document().status(), "Connected");

    relay.wait_until(|hub| hub.subscriber_count() == 1).await.unwrap();
    let live = MessageLine::new("EleutherAI", "hot off the press")
        .attachment("https://cdn.discordapp.com/attachments/1/2/clip.MP4?ex=1");
    relay.append(&live.line()).unwrap();

    controller.handle_event(next_event(&mut events).await);
    assert_eq!(controller.document().message_count(), 2);
    assert_eq!(controller.store().len(), 2);

    let page = controller.document().render();
    assert!(page.contains("hot off the press"));
    assert!(page.contains("<video"));
    // newest on top
    assert!(page.find("hot off the press") < page.find("old news"));

    controller.handle_line("hide EleutherAI");
    assert_eq!(controller.document().is_message_visible(0), Some(false));
    assert_eq!(controller.document().is_message_visible(1), Some(true));
    assert!(controller
        .document()
        .render()
        .contains(".g-EleutherAI { display: none; }"));
}
