//! # feed-viewer
//!
//! Live feed viewer. Fetches guild invites and the message backlog from a
//! relay, follows its subscription, and keeps an HTML snapshot of the page
//! up to date. Guild toggles are driven by commands on stdin:
//!
//! ```text
//! hide EleutherAI
//! show EleutherAI
//! toggle Mathematics
//! status
//! ```

pub mod api;
pub mod commands;
pub mod controller;
pub mod status;
pub mod subscription;

pub use api::{FeedApi, HttpFeedApi};
pub use commands::{spawn_stdin_reader, Command, CommandError};
pub use controller::{FeedController, PAGE_TITLE};
pub use status::ConnectionState;
pub use subscription::{connect, subscribe_url, SubscriptionEvent};

use feed_cache::{FeedStore, FeedStoreConfig, FileStore};
use feed_common::{AppConfig, AppResult};
use feed_core::FeedError;
use feed_render::{ContentPipeline, MessageRenderer};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Commands buffered between the stdin reader and the controller
const COMMAND_BUFFER_SIZE: usize = 16;

/// Run the viewer until the subscription ends and stdin is closed
pub async fn run(config: AppConfig) -> AppResult<()> {
    let viewer = &config.viewer;

    let api = HttpFeedApi::new(&viewer.base_url)?;
    let storage = FileStore::open(&viewer.state_dir).map_err(FeedError::from)?;
    let store = FeedStore::new(storage, FeedStoreConfig::from(viewer));

    let pipeline = ContentPipeline::default().obfuscate(viewer.obfuscate);
    let renderer = MessageRenderer::new(pipeline);

    let mut controller = FeedController::new(renderer, store).with_output(&viewer.output_path);
    controller.start(&api).await;

    let events = connect(subscribe_url(api.base())?);

    let (tx, rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
    let _stdin = spawn_stdin_reader(tx);

    tracing::info!(output = %viewer.output_path.display(), "Viewer running");
    controller.run(events, ReceiverStream::new(rx)).await;

    tracing::info!(state = %controller.state(), "Viewer stopped");
    Ok(())
}
