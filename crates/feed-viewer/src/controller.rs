//! Feed controller
//!
//! Owns the document, the feed store and the renderer, and applies startup,
//! subscription events and user commands to them one at a time.

use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};

use feed_cache::FeedStore;
use feed_core::{FeedError, FeedResult, InviteMap, KeyValueStore, Message};
use feed_render::{checkbox, Document, DomEvent, MessageRenderer, VisibilityFilter};

use crate::api::FeedApi;
use crate::commands::Command;
use crate::status::ConnectionState;
use crate::subscription::SubscriptionEvent;

/// Page title
pub const PAGE_TITLE: &str = "Live feed";

/// Controller for one viewer session
pub struct FeedController<S> {
    renderer: MessageRenderer,
    document: Document,
    store: FeedStore<S>,
    invites: InviteMap,
    state: ConnectionState,
    output: Option<PathBuf>,
}

impl<S: KeyValueStore> FeedController<S> {
    /// Create a controller; nothing is fetched until [`FeedController::start`]
    pub fn new(renderer: MessageRenderer, store: FeedStore<S>) -> Self {
        let mut document = Document::new(PAGE_TITLE, VisibilityFilter::new())
            .with_code_style(renderer.pipeline().stylesheet());
        let state = ConnectionState::Connecting;
        document.set_status(state.label());

        Self {
            renderer,
            document,
            store,
            invites: InviteMap::new(),
            state,
            output: None,
        }
    }

    /// Write a page snapshot to `path` after every change
    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn store(&self) -> &FeedStore<S> {
        &self.store
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn invites(&self) -> &InviteMap {
        &self.invites
    }

    /// Fetch invites and backlog, build toggles and render initial messages.
    ///
    /// Never fails: fetch errors fall back to an empty invite map and to the
    /// cached messages respectively.
    pub async fn start(&mut self, api: &dyn FeedApi) {
        self.invites = match api.invites().await {
            Ok(invites) => invites,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch invites, continuing without");
                InviteMap::new()
            }
        };
        self.build_toggles();

        let backlog = match api.recents().await {
            Ok(Some(messages)) => {
                self.store.replace(messages);
                self.store.messages().to_vec()
            }
            Ok(None) => {
                tracing::info!("Relay has no backlog endpoint, using cached messages");
                self.store.load()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch backlog, using cached messages");
                self.store.load()
            }
        };

        // oldest first so the newest ends up on top
        for message in &backlog {
            self.prepend(message);
        }

        tracing::info!(
            guilds = self.invites.len(),
            messages = backlog.len(),
            "Feed initialized"
        );
        self.write_snapshot().await;
    }

    fn build_toggles(&mut self) {
        let filter = self.document.filter().clone();
        let toggles: Vec<_> = self
            .invites
            .guilds()
            .map(|guild| {
                let filter = filter.clone();
                let name = guild.to_string();
                checkbox(
                    guild,
                    Arc::new(move |event: &DomEvent| {
                        filter.set_hidden(&name, !event.checked.unwrap_or(true));
                    }),
                )
            })
            .collect();
        self.document.set_toggles(toggles);
    }

    /// Process both sources in arrival order until both are exhausted.
    ///
    /// An event stream that ends without a close is treated as closed. The
    /// snapshot is rewritten after every item.
    pub async fn run<E, C>(&mut self, events: E, commands: C)
    where
        E: Stream<Item = SubscriptionEvent>,
        C: Stream<Item = String>,
    {
        let mut events = pin!(events);
        let mut commands = pin!(commands);
        let mut events_open = true;
        let mut commands_open = true;

        while events_open || commands_open {
            tokio::select! {
                event = events.next(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        events_open = false;
                        if !self.state.is_terminal() {
                            self.handle_event(SubscriptionEvent::Closed);
                        }
                    }
                },
                line = commands.next(), if commands_open => match line {
                    Some(line) => self.handle_line(&line),
                    None => {
                        commands_open = false;
                        continue;
                    }
                },
            }
            self.write_snapshot().await;
        }
    }

    /// Apply one subscription event
    pub fn handle_event(&mut self, event: SubscriptionEvent) {
        if self.state.is_terminal() {
            tracing::debug!(event = ?event, "Ignoring event after disconnect");
            return;
        }

        if let Some(next) = self.state.on_event(&event) {
            self.set_state(next);
            match &event {
                SubscriptionEvent::Opened => tracing::info!("Subscription opened"),
                SubscriptionEvent::Closed => tracing::warn!("Subscription closed"),
                SubscriptionEvent::Error(reason) => {
                    tracing::error!(reason = %reason, "Subscription failed");
                }
                SubscriptionEvent::Message(_) => {}
            }
        }

        if let SubscriptionEvent::Message(payload) = event {
            match Message::from_json(&payload) {
                Ok(message) => {
                    tracing::debug!(id = %message.id, guild = %message.guild, "Message received");
                    self.prepend(&message);
                    self.store.append(message);
                }
                Err(e) => tracing::warn!(error = %e, "Dropping malformed message"),
            }
        }
    }

    /// Parse and apply one command line
    pub fn handle_line(&mut self, line: &str) {
        match line.parse::<Command>() {
            Ok(command) => self.handle_command(command),
            Err(e) => tracing::warn!(error = %e, line = %line.trim(), "Ignoring command"),
        }
    }

    /// Apply one command
    pub fn handle_command(&mut self, command: Command) {
        let toggled = match command {
            Command::Hide(guild) => self.toggle(&guild, Some(false)),
            Command::Show(guild) => self.toggle(&guild, Some(true)),
            Command::Toggle(guild) => self.toggle(&guild, None),
            Command::Status => {
                tracing::info!(
                    state = %self.state,
                    messages = self.document.message_count(),
                    visible = self.document.visible_message_count(),
                    cached = self.store.len(),
                    hidden = ?self.document.filter().hidden_guilds(),
                    "Status"
                );
                Ok(())
            }
        };
        if let Err(e) = toggled {
            tracing::warn!(error = %e, code = e.code(), "Command not applied");
        }
    }

    /// Set (or flip, when `checked` is `None`) a guild's toggle
    fn toggle(&mut self, guild: &str, checked: Option<bool>) -> FeedResult<()> {
        let current = self
            .document
            .is_checked(guild)
            .ok_or_else(|| FeedError::UnknownGuild(guild.to_string()))?;
        let checked = checked.unwrap_or(!current);
        self.document.dispatch_toggle(guild, checked);
        tracing::info!(guild = %guild, visible = checked, "Guild toggled");
        Ok(())
    }

    fn prepend(&mut self, message: &Message) {
        let node = self.renderer.render(message, &self.invites);
        self.document.prepend_message(node);
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.document.set_status(state.label());
    }

    /// Write the page snapshot, if an output path is set
    pub async fn write_snapshot(&self) {
        let Some(path) = &self.output else {
            return;
        };
        if let Err(e) = tokio::fs::write(path, self.document.render()).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write snapshot");
        }
    }
}

impl<S> std::fmt::Debug for FeedController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedController")
            .field("state", &self.state)
            .field("guilds", &self.invites.len())
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use feed_cache::{FeedStoreConfig, MemoryStore, MESSAGES_KEY};
    use feed_common::{AppError, AppResult};
    use futures_util::stream;

    struct FakeApi {
        invites: Option<InviteMap>,
        recents: Option<Vec<Message>>,
    }

    #[async_trait]
    impl FeedApi for FakeApi {
        async fn invites(&self) -> AppResult<InviteMap> {
            self.invites
                .clone()
                .ok_or_else(|| AppError::Http("connection refused".to_string()))
        }

        async fn recents(&self) -> AppResult<Option<Vec<Message>>> {
            Ok(self.recents.clone())
        }
    }

    fn invites() -> InviteMap {
        [
            ("EleutherAI", "https://discord.gg/zBGx3azzUn"),
            ("Mathematics", "https://discord.gg/mathematics"),
        ]
        .into_iter()
        .collect()
    }

    fn payload(id: usize, guild: &str) -> String {
        format!(
            r#"{{"id":"{id}","guild":"{guild}","guild_id":"1","channel":"general","channel_id":"2","author":{{"name":"alice"}},"content":"message {id}"}}"#
        )
    }

    fn message(id: usize, guild: &str) -> Message {
        Message::from_json(&payload(id, guild)).unwrap()
    }

    fn controller(capacity: usize) -> FeedController<Arc<MemoryStore>> {
        controller_with(Arc::new(MemoryStore::new()), capacity)
    }

    fn controller_with(storage: Arc<MemoryStore>, capacity: usize) -> FeedController<Arc<MemoryStore>> {
        let store = FeedStore::new(
            storage,
            FeedStoreConfig {
                capacity,
                ..FeedStoreConfig::default()
            },
        );
        FeedController::new(MessageRenderer::default(), store)
    }

    fn top_text(controller: &FeedController<Arc<MemoryStore>>) -> String {
        controller.document().messages()[0]
            .as_element()
            .unwrap()
            .find_by_class("messageContent")
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_startup_with_nothing_renders_toggles_only() {
        let mut controller = controller(100);
        let api = FakeApi {
            invites: Some(invites()),
            recents: Some(vec![]),
        };
        controller.start(&api).await;

        assert_eq!(controller.document().message_count(), 0);
        assert_eq!(controller.document().toggle_count(), 2);
        assert_eq!(controller.document().is_checked("EleutherAI"), Some(true));
        assert_eq!(controller.state(), ConnectionState::Connecting);
        assert_eq!(controller.document().status(), "Connecting…");
    }

    #[tokio::test]
    async fn test_startup_renders_backlog_newest_on_top() {
        let mut controller = controller(100);
        let api = FakeApi {
            invites: Some(invites()),
            recents: Some(vec![message(1, "EleutherAI"), message(2, "Mathematics")]),
        };
        controller.start(&api).await;

        assert_eq!(controller.document().message_count(), 2);
        assert!(top_text(&controller).contains("message 2"));
        assert_eq!(controller.store().len(), 2);
    }

    #[tokio::test]
    async fn test_startup_falls_back_to_cache() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(
                MESSAGES_KEY,
                &serde_json::to_string(&vec![message(7, "EleutherAI")]).unwrap(),
            )
            .unwrap();

        let mut controller = controller_with(storage, 100);
        let api = FakeApi {
            invites: None,
            recents: None,
        };
        controller.start(&api).await;

        // invites failed: no toggles, but the cached message still renders
        assert_eq!(controller.document().toggle_count(), 0);
        assert_eq!(controller.document().message_count(), 1);
        assert!(top_text(&controller).contains("message 7"));
    }

    #[tokio::test]
    async fn test_events_update_state_and_feed() {
        let mut controller = controller(100);
        controller
            .start(&FakeApi {
                invites: Some(invites()),
                recents: Some(vec![]),
            })
            .await;

        controller.handle_event(SubscriptionEvent::Opened);
        assert_eq!(controller.state(), ConnectionState::Connected);
        assert_eq!(controller.document().status(), "Connected");

        controller.handle_event(SubscriptionEvent::Message(payload(1, "EleutherAI")));
        controller.handle_event(SubscriptionEvent::Message("{broken".to_string()));
        assert_eq!(controller.document().message_count(), 1);
        assert_eq!(controller.store().len(), 1);
        assert_eq!(controller.state(), ConnectionState::Connected);

        controller.handle_event(SubscriptionEvent::Error("reset".to_string()));
        assert_eq!(controller.document().status(), "Disconnected, refresh?");

        // nothing is applied after disconnect
        controller.handle_event(SubscriptionEvent::Message(payload(2, "EleutherAI")));
        controller.handle_event(SubscriptionEvent::Opened);
        assert_eq!(controller.document().message_count(), 1);
        assert_eq!(controller.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_cache_holds_most_recent_capacity() {
        let mut controller = controller(5);
        controller
            .start(&FakeApi {
                invites: Some(invites()),
                recents: Some(vec![]),
            })
            .await;

        for id in 0..12 {
            controller.handle_event(SubscriptionEvent::Message(payload(id, "EleutherAI")));
        }

        let ids: Vec<&str> = controller
            .store()
            .messages()
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["7", "8", "9", "10", "11"]);
        // the page keeps every rendered message
        assert_eq!(controller.document().message_count(), 12);
    }

    #[tokio::test]
    async fn test_commands_toggle_visibility() {
        let mut controller = controller(100);
        controller
            .start(&FakeApi {
                invites: Some(invites()),
                recents: Some(vec![message(1, "EleutherAI"), message(2, "Mathematics")]),
            })
            .await;

        controller.handle_line("hide EleutherAI");
        assert!(controller.document().filter().is_hidden("EleutherAI"));
        // newest first: Mathematics, EleutherAI
        assert_eq!(controller.document().is_message_visible(0), Some(true));
        assert_eq!(controller.document().is_message_visible(1), Some(false));

        // messages arriving while hidden are hidden too
        controller.handle_event(SubscriptionEvent::Message(payload(3, "EleutherAI")));
        assert_eq!(controller.document().is_message_visible(0), Some(false));

        controller.handle_line("toggle EleutherAI");
        assert!(!controller.document().filter().is_hidden("EleutherAI"));
        assert_eq!(controller.document().visible_message_count(), 3);

        let err = controller.toggle("Nowhere", Some(false)).unwrap_err();
        assert!(matches!(err, FeedError::UnknownGuild(ref guild) if guild == "Nowhere"));

        controller.handle_line("hide Nowhere");
        controller.handle_line("dance");
        controller.handle_line("status");
        assert_eq!(controller.document().filter().rule_count(), 0);
    }

    #[tokio::test]
    async fn test_run_processes_streams_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("feed.html");

        let mut controller = controller(100).with_output(&output);
        controller
            .start(&FakeApi {
                invites: Some(invites()),
                recents: Some(vec![]),
            })
            .await;

        let events = stream::iter(vec![
            SubscriptionEvent::Opened,
            SubscriptionEvent::Message(payload(1, "EleutherAI")),
            SubscriptionEvent::Message(payload(2, "Mathematics")),
        ]);
        let commands = stream::iter(vec!["hide Mathematics".to_string()]);

        controller.run(events, commands).await;

        // stream ended without a close frame
        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert_eq!(controller.document().message_count(), 2);
        assert!(controller.document().filter().is_hidden("Mathematics"));

        let page = std::fs::read_to_string(&output).unwrap();
        assert!(page.contains("Disconnected, refresh?"));
        assert!(page.contains(".g-Mathematics { display: none; }"));
    }

    #[tokio::test]
    async fn test_snapshot_written_by_start_and_run_only() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("feed.html");

        let mut controller = controller(100).with_output(&output);
        controller
            .start(&FakeApi {
                invites: Some(invites()),
                recents: Some(vec![]),
            })
            .await;
        let page = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(page.contains("Connecting…"));
        assert!(page.contains(".hl-"));

        // direct handlers only touch the in-memory page
        controller.handle_event(SubscriptionEvent::Opened);
        let page = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(page.contains("Connecting…"));

        controller
            .run(stream::iter(vec![SubscriptionEvent::Closed]), stream::empty::<String>())
            .await;
        let page = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(page.contains("Disconnected, refresh?"));
    }
}
