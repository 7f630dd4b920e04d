//! Live subscription client
//!
//! Connects to the relay's `/subscribe` websocket and turns the connection's
//! life cycle into a stream of [`SubscriptionEvent`]s.

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use url::Url;

use feed_common::{AppError, AppResult};
use feed_core::FeedError;

/// Buffer between the socket reader and the controller
const EVENT_BUFFER_SIZE: usize = 64;

/// Subscription life-cycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    Opened,
    /// Raw text frame, expected to hold one JSON message
    Message(String),
    Closed,
    Error(String),
}

/// Derive the websocket URL for `base`, mirroring its scheme
pub fn subscribe_url(base: &Url) -> AppResult<Url> {
    let scheme = match base.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(FeedError::InvalidUrl(format!("unsupported scheme `{other}`")).into());
        }
    };

    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|()| FeedError::InvalidUrl(base.to_string()))?;
    url.set_path("/subscribe");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Open the subscription in a background task.
///
/// The stream yields `Opened`, then one `Message` per text frame, and ends
/// after a single `Closed` or `Error`.
pub fn connect(url: Url) -> impl Stream<Item = SubscriptionEvent> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER_SIZE);
    tokio::spawn(read_socket(url, tx));
    ReceiverStream::new(rx)
}

async fn read_socket(url: Url, tx: mpsc::Sender<SubscriptionEvent>) {
    tracing::debug!(url = %url, "Opening subscription");

    let (mut stream, _) = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok(connected) => connected,
        Err(e) => {
            let _ = tx.send(socket_error(e)).await;
            return;
        }
    };

    if tx.send(SubscriptionEvent::Opened).await.is_err() {
        return;
    }

    let last = loop {
        let event = match stream.next().await {
            Some(Ok(WsMessage::Text(text))) => SubscriptionEvent::Message(text),
            Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => SubscriptionEvent::Message(text),
                Err(_) => {
                    tracing::debug!("Ignoring non-UTF-8 binary frame");
                    continue;
                }
            },
            Some(Ok(WsMessage::Close(_))) | None => break SubscriptionEvent::Closed,
            Some(Ok(_)) => continue,
            Some(Err(e)) => break socket_error(e),
        };

        if tx.send(event).await.is_err() {
            // controller is gone
            return;
        }
    };

    let _ = tx.send(last).await;
}

fn socket_error(err: tokio_tungstenite::tungstenite::Error) -> SubscriptionEvent {
    SubscriptionEvent::Error(AppError::websocket(err).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_url_mirrors_scheme() {
        let http = Url::parse("http://127.0.0.1:8000").unwrap();
        assert_eq!(
            subscribe_url(&http).unwrap().as_str(),
            "ws://127.0.0.1:8000/subscribe"
        );

        let https = Url::parse("https://feed.example.com/viewer/?x=1").unwrap();
        assert_eq!(
            subscribe_url(&https).unwrap().as_str(),
            "wss://feed.example.com/subscribe"
        );
    }

    #[test]
    fn test_subscribe_url_rejects_other_schemes() {
        let ftp = Url::parse("ftp://example.com").unwrap();
        assert!(subscribe_url(&ftp).is_err());
    }

    #[tokio::test]
    async fn test_connect_failure_yields_error() {
        // nothing listens on port 9 locally
        let url = Url::parse("ws://127.0.0.1:9/subscribe").unwrap();
        let events: Vec<SubscriptionEvent> = connect(url).collect().await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            SubscriptionEvent::Error(reason) => assert!(reason.starts_with("WebSocket error:")),
            other => panic!("expected an error, got {other:?}"),
        }
    }
}
