//! Relay HTTP endpoints
//!
//! The invite map and the backlog are fetched once at startup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use feed_common::{AppError, AppResult};
use feed_core::{FeedError, InviteMap, Message};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the invite map and message backlog
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// Guild name to invite URL
    async fn invites(&self) -> AppResult<InviteMap>;

    /// Recent messages, oldest first; `None` if the relay has no backlog endpoint
    async fn recents(&self) -> AppResult<Option<Vec<Message>>>;
}

/// [`FeedApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpFeedApi {
    client: Client,
    base: Url,
}

impl HttpFeedApi {
    /// Create a client for the relay at `base_url`
    pub fn new(base_url: &str) -> AppResult<Self> {
        let mut base =
            Url::parse(base_url).map_err(|e| FeedError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(AppError::http)?;

        Ok(Self { client, base })
    }

    /// Base URL with a trailing slash
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, name: &str) -> AppResult<Url> {
        self.base
            .join(name)
            .map_err(|e| FeedError::InvalidUrl(e.to_string()).into())
    }
}

#[async_trait]
impl FeedApi for HttpFeedApi {
    async fn invites(&self) -> AppResult<InviteMap> {
        let url = self.endpoint("invites")?;
        let response = self.client.get(url).send().await.map_err(AppError::http)?;

        if !response.status().is_success() {
            return Err(AppError::Http(format!("/invites returned {}", response.status())));
        }
        response.json().await.map_err(AppError::http)
    }

    async fn recents(&self) -> AppResult<Option<Vec<Message>>> {
        let url = self.endpoint("recents")?;
        let response = self.client.get(url).send().await.map_err(AppError::http)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let entries: Vec<serde_json::Value> =
                    response.json().await.map_err(AppError::http)?;
                Ok(Some(decode_backlog(entries)))
            }
            status => Err(AppError::Http(format!("/recents returned {status}"))),
        }
    }
}

/// Decode backlog entries one by one, skipping any that are malformed
fn decode_backlog(entries: Vec<serde_json::Value>) -> Vec<Message> {
    let total = entries.len();
    let messages: Vec<Message> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed backlog entry");
                None
            }
        })
        .collect();

    if messages.len() < total {
        tracing::debug!(kept = messages.len(), total, "Backlog partially decoded");
    }
    messages
}
