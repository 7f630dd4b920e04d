//! Test helpers for integration tests
//!
//! Provides a relay over a temporary message log, HTTP shortcuts, and
//! response assertions.

use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use feed_common::RelayConfig;
use feed_core::InviteMap;
use feed_relay::{create_app, follow, run_server, Hub, RelayState, TailConfig};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How long [`wait_until`] polls before giving up
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Relay instance over a temporary message log
pub struct TestRelay {
    pub addr: SocketAddr,
    pub client: Client,
    hub: Arc<Hub>,
    log_path: PathBuf,
    _dir: TempDir,
    _server: JoinHandle<()>,
    _tail: JoinHandle<()>,
}

impl TestRelay {
    /// Start a relay with an empty log
    pub async fn start(invites: InviteMap) -> Result<Self> {
        Self::start_with_backlog(invites, &[]).await
    }

    /// Start a relay whose log already holds `backlog` lines
    pub async fn start_with_backlog(invites: InviteMap, backlog: &[String]) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let log_path = dir.path().join("messages.json");

        let mut contents = String::new();
        for line in backlog {
            contents.push_str(line);
            contents.push('\n');
        }
        std::fs::write(&log_path, contents)?;

        let config = RelayConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            messages_path: log_path.clone(),
            invites,
            recents_capacity: 50,
            queue_size: 64,
        };

        let state = RelayState::from_config(config);
        let hub = state.hub().clone();

        let tail_hub = hub.clone();
        let tail_config = TailConfig::new(&log_path).poll_interval(Duration::from_millis(20));
        let tail = tokio::spawn(async move {
            follow(tail_hub, tail_config).await.ok();
        });

        // Bind to an OS-assigned port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = create_app(state);
        let server = tokio::spawn(async move {
            run_server(app, listener).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        let relay = Self {
            addr,
            client,
            hub,
            log_path,
            _dir: dir,
            _server: server,
            _tail: tail,
        };

        // lines appended before the backlog is read would not be broadcast
        relay.wait_until(Hub::is_following).await?;
        Ok(relay)
    }

    /// Get base URL for the relay
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Append one line to the message log
    pub fn append(&self, line: &str) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Poll the hub until `condition` holds
    pub async fn wait_until(&self, condition: impl Fn(&Hub) -> bool) -> Result<()> {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        while !condition(&self.hub) {
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("Timed out waiting for relay: {:?}", self.hub);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
