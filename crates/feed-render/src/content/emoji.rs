//! Custom emoji substitution

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// CDN serving custom emoji images by id
pub const EMOJI_CDN: &str = "https://cdn.discordapp.com/emojis";

static EMOJI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<:(\w+):(\d+)>").expect("emoji pattern is valid"));

/// Replace custom emoji markup `<:name:id>` with a markdown image.
///
/// Only the first occurrence is replaced.
// TODO: animated emoji use `<a:name:id>` and a `.gif` CDN path
pub fn emojify(content: &str) -> Cow<'_, str> {
    EMOJI_PATTERN.replace(
        content,
        format!("![${{1}}]({EMOJI_CDN}/${{2}}.webp?size=44&quality=lossless)").as_str(),
    )
}
