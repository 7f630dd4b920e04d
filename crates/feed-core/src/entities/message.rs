//! Message entity - one chat message relayed into the feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FeedError, FeedResult};

/// Color a producer reports when the author has no role color
pub const DEFAULT_AUTHOR_COLOR: &str = "#000000";

/// Attachment extensions presented as video; everything else is an image
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "webm", "mkv"];

/// Message entity
///
/// Identity is `id`; a message is never mutated after it is received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub guild: String,
    pub guild_id: String,
    pub channel: String,
    pub channel_id: String,
    pub author: Author,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(
        default,
        with = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Message author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    /// Global avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Guild-specific avatar URL, preferred over `avatar`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_avatar: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub bot: bool,
}

/// Rich embed content attached by the author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How an attachment is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Image,
    Video,
}

fn default_color() -> String {
    DEFAULT_AUTHOR_COLOR.to_string()
}

impl Message {
    /// Parse a single message from its JSON encoding
    pub fn from_json(payload: &str) -> FeedResult<Self> {
        serde_json::from_str(payload).map_err(|e| FeedError::MalformedPayload(e.to_string()))
    }

    /// Encode the message as JSON
    pub fn to_json(&self) -> FeedResult<String> {
        serde_json::to_string(self).map_err(|e| FeedError::Internal(e.to_string()))
    }

    /// Link to the channel the message was posted in
    pub fn channel_url(&self) -> String {
        format!(
            "https://discord.com/channels/{}/{}",
            self.guild_id, self.channel_id
        )
    }

    /// Link to the exact message
    pub fn message_url(&self) -> String {
        format!("{}/{}", self.channel_url(), self.id)
    }

    /// Check if the message was sent by a bot
    #[inline]
    pub fn is_from_bot(&self) -> bool {
        self.author.bot
    }

    /// Embeds that should be shown (only bot embeds are displayed)
    pub fn visible_embeds(&self) -> &[Embed] {
        if self.is_from_bot() {
            &self.embeds
        } else {
            &[]
        }
    }

    /// Attachments paired with their presentation kind, in order
    pub fn classified_attachments(&self) -> impl Iterator<Item = (&str, AttachmentKind)> + '_ {
        self.attachments
            .iter()
            .map(|url| (url.as_str(), AttachmentKind::classify(url)))
    }
}

impl Author {
    /// Check if the author reported no display color
    #[inline]
    pub fn has_default_color(&self) -> bool {
        self.color == DEFAULT_AUTHOR_COLOR
    }
}

impl Embed {
    /// Check if the embed carries no displayable text
    pub fn is_empty(&self) -> bool {
        self.title.as_deref().map_or(true, str::is_empty)
            && self.description.as_deref().map_or(true, str::is_empty)
    }
}

impl AttachmentKind {
    /// Classify an attachment URL by the extension of its path
    pub fn classify(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let extension = path
            .rsplit_once('/')
            .map_or(path, |(_, file)| file)
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension {
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => Self::Video,
            _ => Self::Image,
        }
    }
}

/// Lenient `created_at` encoding.
///
/// Accepts RFC 3339 and the `YYYY-MM-DD HH:MM:SS[.f]+HH:MM` form written by
/// the message producer. Anything else, including non-string values,
/// decodes as `None` so legacy cache entries still load.
mod created_at {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    const PRODUCER_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(raw)) => Ok(parse(&raw)),
            _ => Ok(None),
        }
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, PRODUCER_FORMAT))
            .map(|ts| ts.with_timezone(&Utc))
            .ok()
    }
}
