//! Message renderer - one detached subtree per message

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use feed_core::{AttachmentKind, Author, InviteMap, Message};
use url::Url;

use crate::content::ContentPipeline;
use crate::dom::{h, AttrValue, Node};
use crate::visibility::class_token;

/// Avatar shown when the author has none
pub const PLACEHOLDER_AVATAR: &str = "https://cdn.discordapp.com/embed/avatars/0.png";

/// Size requested for every avatar
pub const AVATAR_SIZE: &str = "80";

/// Readable replacement for the "no color" sentinel on a dark background
pub const FALLBACK_NAME_COLOR: &str = "#eeeeee";

/// Source of the current time for relative timestamps
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Renders messages into detached nodes
#[derive(Clone)]
pub struct MessageRenderer {
    pipeline: ContentPipeline,
    clock: Clock,
}

impl fmt::Debug for MessageRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRenderer")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new(ContentPipeline::default())
    }
}

impl MessageRenderer {
    #[must_use]
    pub fn new(pipeline: ContentPipeline) -> Self {
        Self {
            pipeline,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock used for relative timestamps
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn pipeline(&self) -> &ContentPipeline {
        &self.pipeline
    }

    /// Build the subtree for one message.
    ///
    /// The result depends only on the message, the invite map and the clock.
    pub fn render(&self, message: &Message, invites: &InviteMap) -> Node {
        let mut guild_attrs = vec![("class", AttrValue::from("guild"))];
        if let Some(invite) = invites.get(&message.guild) {
            guild_attrs.push(("href", invite.into()));
        }

        let mut children = vec![
            h("a", guild_attrs, [Node::text(&message.guild)]),
            h(
                "a",
                [
                    ("class", "channel".into()),
                    ("href", message.message_url().into()),
                ],
                [Node::text(&message.channel)],
            ),
            self.render_author(message),
            h(
                "div",
                [("class", "content".into())],
                [
                    h(
                        "div",
                        [
                            ("class", "messageContent".into()),
                            ("html", self.pipeline.render(&message.content).into()),
                        ],
                        [],
                    ),
                    h(
                        "div",
                        [
                            ("class", "embedContent".into()),
                            (
                                "html",
                                self.pipeline.render_embeds(message).into(),
                            ),
                        ],
                        [],
                    ),
                ],
            ),
        ];
        children.extend(message.classified_attachments().map(attachment));

        h(
            "div",
            [
                ("class", format!("message {}", class_token(&message.guild)).into()),
                ("data-id", message.id.as_str().into()),
            ],
            children,
        )
    }

    fn render_author(&self, message: &Message) -> Node {
        let author = &message.author;
        let mut children = vec![
            h(
                "img",
                [("class", "avatar".into()), ("src", avatar_url(author).into())],
                [],
            ),
            h(
                "div",
                [("class", "name".into()), ("style", name_style(author).into())],
                [Node::text(&author.name)],
            ),
        ];

        if let Some(created_at) = message.created_at {
            children.push(h(
                "time",
                [
                    ("datetime", created_at.to_rfc3339().into()),
                    (
                        "title",
                        created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().into(),
                    ),
                ],
                [Node::text(relative_time(created_at, (self.clock)()))],
            ));
        }

        h("div", [("class", "author".into())], children)
    }
}

fn attachment((url, kind): (&str, AttachmentKind)) -> Node {
    match kind {
        AttachmentKind::Video => h("video", [("src", url.into()), ("controls", "".into())], []),
        AttachmentKind::Image => h("img", [("src", url.into())], []),
    }
}

/// Resolve the avatar to display, always requested at size 80.
///
/// Guild avatar first, then the global avatar, then the placeholder.
pub fn avatar_url(author: &Author) -> String {
    let source = author
        .guild_avatar
        .as_deref()
        .or(author.avatar.as_deref())
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .unwrap_or(PLACEHOLDER_AVATAR);

    match Url::parse(source) {
        Ok(mut url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| key != "size")
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            url.set_query(None);
            url.query_pairs_mut()
                .extend_pairs(kept)
                .append_pair("size", AVATAR_SIZE);
            url.into()
        }
        Err(e) => {
            tracing::debug!(avatar = %source, error = %e, "Unparseable avatar URL");
            format!("{source}?size={AVATAR_SIZE}")
        }
    }
}

/// Inline style for an author name
pub fn name_style(author: &Author) -> String {
    let color = if author.has_default_color() {
        FALLBACK_NAME_COLOR
    } else {
        &author.color
    };
    format!("color: {color}")
}

/// Human-readable age of `then` as seen at `now`
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);

    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        plural(minutes, "minute")
    } else if days < 1 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
