//! Content pipeline
//!
//! Raw message text becomes trusted HTML in four steps: optional letter
//! rotation, custom emoji substitution, embed flattening (bots only), and
//! markdown rendering.

mod embeds;
mod emoji;
mod highlight;
mod markdown;
mod obfuscate;

pub use embeds::flatten_embeds;
pub use emoji::{emojify, EMOJI_CDN};
pub use highlight::{highlight_css, HighlightError, Highlighter, SyntectHighlighter};
pub use markdown::MarkdownRenderer;
pub use obfuscate::rot13;

use std::borrow::Cow;

use feed_core::Message;

use crate::html::SafeHtml;

/// Renders message text and embeds to trusted HTML
#[derive(Debug, Clone, Default)]
pub struct ContentPipeline {
    obfuscate: bool,
    markdown: MarkdownRenderer,
}

impl ContentPipeline {
    /// Create a pipeline around a markdown renderer
    #[must_use]
    pub fn new(markdown: MarkdownRenderer) -> Self {
        Self {
            obfuscate: false,
            markdown,
        }
    }

    /// Enable or disable the letter-rotation pass
    #[must_use]
    pub fn obfuscate(mut self, enabled: bool) -> Self {
        self.obfuscate = enabled;
        self
    }

    /// Check if the letter-rotation pass is enabled
    pub fn is_obfuscating(&self) -> bool {
        self.obfuscate
    }

    /// CSS the rendered content depends on
    pub fn stylesheet(&self) -> &str {
        self.markdown.stylesheet()
    }

    /// Render raw message text
    pub fn render(&self, raw: &str) -> SafeHtml {
        let text = if self.obfuscate {
            Cow::Owned(rot13(raw))
        } else {
            Cow::Borrowed(raw)
        };
        let text = emojify(&text);
        self.markdown.render(&text)
    }

    /// Render the embeds a message displays; only bot-authored embeds produce output
    pub fn render_embeds(&self, message: &Message) -> SafeHtml {
        let embeds = message.visible_embeds();
        if embeds.is_empty() {
            return SafeHtml::empty();
        }
        self.render(&flatten_embeds(embeds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_core::{Author, Embed};

    fn with_embeds(embeds: Vec<Embed>, bot: bool) -> Message {
        Message {
            id: "1".to_string(),
            guild: "EleutherAI".to_string(),
            guild_id: "2".to_string(),
            channel: "general".to_string(),
            channel_id: "3".to_string(),
            author: Author {
                name: "bot".to_string(),
                avatar: None,
                guild_avatar: None,
                color: "#000000".to_string(),
                bot,
            },
            content: String::new(),
            embeds,
            attachments: vec![],
            created_at: None,
        }
    }

    fn embed(title: &str, description: &str) -> Embed {
        Embed {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
        }
    }

    #[test]
    fn test_render_plain_markdown() {
        let html = ContentPipeline::default().render("hello **world**");
        assert_eq!(html.as_str(), "<p>hello <strong>world</strong></p>\n");
    }

    #[test]
    fn test_emoji_rendered_as_image() {
        let html = ContentPipeline::default().render("<:Hmmmm:928586668787785728> hi");
        assert!(html
            .as_str()
            .contains(r#"<img src="https://cdn.discordapp.com/emojis/928586668787785728.webp?size=44&amp;quality=lossless" alt="Hmmmm" />"#));
        assert!(html.as_str().contains(" hi"));
    }

    #[test]
    fn test_obfuscation_applies_before_rendering() {
        let pipeline = ContentPipeline::default().obfuscate(true);
        assert!(pipeline.is_obfuscating());
        assert_eq!(pipeline.render("Hello").as_str(), "<p>Uryyb</p>\n");
        // emoji ids survive rotation
        assert!(pipeline
            .render("<:Hmmmm:928586668787785728>")
            .as_str()
            .contains("928586668787785728.webp"));
    }

    #[test]
    fn test_embeds_rendered_only_for_bots() {
        let pipeline = ContentPipeline::default();
        let embeds = vec![embed("Title", "Body")];

        assert!(pipeline.render_embeds(&with_embeds(embeds.clone(), false)).is_empty());
        assert_eq!(
            pipeline.render_embeds(&with_embeds(embeds, true)).as_str(),
            "<p><strong>Title</strong><br />\nBody</p>\n"
        );
        assert!(pipeline.render_embeds(&with_embeds(vec![], true)).is_empty());
    }

    #[test]
    fn test_embeds_obfuscated_uniformly() {
        let pipeline = ContentPipeline::default().obfuscate(true);
        let html = pipeline.render_embeds(&with_embeds(vec![embed("abc", "xyz")], true));
        assert!(html.as_str().contains("<strong>nop</strong>"));
        assert!(html.as_str().contains("klm"));
    }

    #[test]
    fn test_known_language_code_is_highlighted() {
        let pipeline = ContentPipeline::default();
        let html = pipeline.render("```rust\nfn main() {}\n```");
        assert!(html.as_str().contains("<span class=\"hl-"));
        assert!(pipeline.stylesheet().contains(".hl-"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let pipeline = ContentPipeline::default();
        let text = "see https://example.com and `code`";
        assert_eq!(pipeline.render(text), pipeline.render(text));
    }
}
