//! Message log follower
//!
//! Reads the JSON-lines log from the start into the recent window, then
//! follows appended lines and publishes each one. A log that shrinks, or
//! whose leading bytes change, is treated as rotated and read again from the
//! start.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use feed_common::{AppError, RelayConfig};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};

use crate::hub::Hub;

/// Leading bytes remembered to notice the log being rewritten in place
const HEAD_LEN: usize = 64;

/// Log follower configuration
#[derive(Debug, Clone)]
pub struct TailConfig {
    pub path: PathBuf,
    /// Delay between polls once the end of the log is reached
    pub poll_interval: Duration,
}

impl TailConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: Duration::from_millis(250),
        }
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl From<&RelayConfig> for TailConfig {
    fn from(config: &RelayConfig) -> Self {
        Self::new(config.messages_path.clone())
    }
}

/// Follow the log forever, feeding `hub`.
///
/// Only returns on an I/O error.
pub async fn follow(hub: Arc<Hub>, config: TailConfig) -> Result<(), AppError> {
    let file = open_when_present(&config).await?;
    let mut reader = BufReader::new(file);

    let mut line = String::new();
    let mut offset: u64 = 0;
    let mut head: Vec<u8> = Vec::with_capacity(HEAD_LEN);
    let mut live = false;

    loop {
        let read = reader.read_line(&mut line).await?;

        if read == 0 {
            if !live {
                live = true;
                hub.mark_following();
                tracing::info!(
                    path = %config.path.display(),
                    recents = hub.recents().len(),
                    "Backlog loaded, following message log"
                );
            }

            tokio::time::sleep(config.poll_interval).await;

            if was_rewritten(&config.path, offset, &head).await? {
                tracing::warn!(path = %config.path.display(), "Message log rewritten, reading from start");
                reader.seek(SeekFrom::Start(0)).await?;
                offset = 0;
                head.clear();
                line.clear();
            }
            continue;
        }

        offset += read as u64;
        if head.len() < HEAD_LEN {
            let fresh = &line.as_bytes()[line.len() - read..];
            let take = fresh.len().min(HEAD_LEN - head.len());
            head.extend_from_slice(&fresh[..take]);
        }

        // partial line, wait for the rest
        if !line.ends_with('\n') {
            continue;
        }

        if !line.trim().is_empty() {
            let result = if live {
                hub.publish(&line).map(|_| ())
            } else {
                hub.backfill(&line)
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "Skipping malformed log line");
            }
        }
        line.clear();
    }
}

/// Check if the log shrank below `offset` or no longer starts with `head`
async fn was_rewritten(path: &Path, offset: u64, head: &[u8]) -> std::io::Result<bool> {
    let mut file = File::open(path).await?;
    if file.metadata().await?.len() < offset {
        return Ok(true);
    }

    let mut current = vec![0; head.len()];
    let mut filled = 0;
    while filled < current.len() {
        let n = file.read(&mut current[filled..]).await?;
        if n == 0 {
            return Ok(true);
        }
        filled += n;
    }
    Ok(current != head)
}

async fn open_when_present(config: &TailConfig) -> Result<File, AppError> {
    let mut warned = false;
    loop {
        match File::open(&config.path).await {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !warned {
                    tracing::warn!(path = %config.path.display(), "Message log not found, waiting for it");
                    warned = true;
                }
                tokio::time::sleep(config.poll_interval).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
