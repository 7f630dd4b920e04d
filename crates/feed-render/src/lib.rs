//! # feed-render
//!
//! Turns feed messages into HTML.
//!
//! ## Features
//!
//! - **Content Pipeline**: obfuscation, emoji substitution, embed flattening, markdown
//! - **Element Builder**: `h`-style node construction with trusted-HTML and handler attributes
//! - **Visibility Filter**: per-guild hide rules that never touch rendered nodes
//! - **Message Renderer**: one node subtree per message
//!
//! ## Example
//!
//! ```ignore
//! use feed_render::{ContentPipeline, MessageRenderer, VisibilityFilter, Document};
//!
//! let renderer = MessageRenderer::new(ContentPipeline::default());
//! let mut document = Document::new("Live feed", VisibilityFilter::new());
//!
//! document.prepend_message(renderer.render(&message, &invites));
//! document.filter().set_hidden("EleutherAI", true);
//! let page = document.render();
//! ```

pub mod content;
pub mod dom;
pub mod html;
pub mod message;
pub mod visibility;

pub use content::{
    emojify, flatten_embeds, rot13, ContentPipeline, HighlightError, Highlighter,
    highlight_css, MarkdownRenderer, SyntectHighlighter,
};
pub use dom::{
    checkbox, checkbox_id, h, handler, AttrValue, Document, DomEvent, Element, Handler, Node,
    CONNECTION_STATUS_ID,
};
pub use html::SafeHtml;
pub use message::{avatar_url, name_style, relative_time, Clock, MessageRenderer, PLACEHOLDER_AVATAR};
pub use visibility::{class_token, escape_name, VisibilityFilter};
