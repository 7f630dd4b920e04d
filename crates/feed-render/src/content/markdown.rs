//! Markdown rendering
//!
//! pulldown-cmark configured for chat text: raw HTML is shown as text, bare
//! URLs become links, single newlines become line breaks, and fenced code is
//! routed through a [`Highlighter`].

use std::sync::{Arc, LazyLock};

use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use regex::Regex;

use super::highlight::{Highlighter, SyntectHighlighter};
use crate::html::SafeHtml;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+").expect("url pattern is valid")
});

const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "file:"];

const ALLOWED_DATA_IMAGES: [&str; 4] = [
    "data:image/gif;",
    "data:image/png;",
    "data:image/jpeg;",
    "data:image/webp;",
];

/// Markdown to HTML renderer
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
    highlighter: Arc<dyn Highlighter>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(Arc::new(SyntectHighlighter))
    }
}

#[derive(Default)]
struct RenderState {
    /// One entry per open link or image; `true` when it was dropped
    links: Vec<bool>,
    code: Option<CodeBuffer>,
}

struct CodeBuffer {
    language: String,
    source: String,
}

impl MarkdownRenderer {
    /// Create a renderer using `highlighter` for fenced code
    #[must_use]
    pub fn new(highlighter: Arc<dyn Highlighter>) -> Self {
        Self {
            options: Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
            highlighter,
        }
    }

    /// Create a renderer owning `highlighter`
    #[must_use]
    pub fn with_highlighter(highlighter: impl Highlighter + 'static) -> Self {
        Self::new(Arc::new(highlighter))
    }

    /// CSS for highlighted code blocks
    pub fn stylesheet(&self) -> &str {
        self.highlighter.stylesheet()
    }

    /// Render markdown text to trusted HTML
    pub fn render(&self, text: &str) -> SafeHtml {
        let parser = TextMergeStream::new(Parser::new_ext(text, self.options));

        let mut state = RenderState::default();
        let mut events = Vec::new();
        for event in parser {
            self.push_event(event, &mut state, &mut events);
        }

        let mut out = String::with_capacity(text.len() + text.len() / 2);
        html::push_html(&mut out, events.into_iter());
        SafeHtml::trusted(out)
    }

    fn push_event<'a>(&self, event: Event<'a>, state: &mut RenderState, out: &mut Vec<Event<'a>>) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match &kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or_default().to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                state.code = Some(CodeBuffer {
                    language,
                    source: String::new(),
                });
                out.push(Event::Start(Tag::CodeBlock(kind)));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = state.code.take() {
                    out.push(self.code_event(block));
                }
                out.push(Event::End(TagEnd::CodeBlock));
            }
            Event::Text(text) => {
                if let Some(block) = state.code.as_mut() {
                    block.source.push_str(&text);
                } else if state.links.is_empty() {
                    linkify(text, out);
                } else {
                    out.push(Event::Text(text));
                }
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dropped = !is_safe_destination(&dest_url);
                if dropped {
                    tracing::debug!(destination = %dest_url, "Dropping unsafe link");
                } else {
                    out.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                }
                state.links.push(dropped);
            }
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dropped = !is_safe_destination(&dest_url);
                if dropped {
                    tracing::debug!(destination = %dest_url, "Dropping unsafe image");
                } else {
                    out.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                }
                state.links.push(dropped);
            }
            Event::End(end @ (TagEnd::Link | TagEnd::Image)) => {
                if !state.links.pop().unwrap_or(false) {
                    out.push(Event::End(end));
                }
            }
            // raw HTML is never passed through
            Event::Html(raw) | Event::InlineHtml(raw) => out.push(Event::Text(raw)),
            Event::SoftBreak => out.push(Event::HardBreak),
            other => out.push(other),
        }
    }

    fn code_event(&self, block: CodeBuffer) -> Event<'static> {
        if !block.language.is_empty() && self.highlighter.supports(&block.language) {
            match self.highlighter.highlight(&block.source, &block.language) {
                Ok(markup) => return Event::Html(markup.into()),
                Err(e) => {
                    tracing::debug!(
                        language = %block.language,
                        error = %e,
                        "Highlighting failed, rendering plain code"
                    );
                }
            }
        }
        Event::Text(block.source.into())
    }
}

/// Split text into plain runs and autolinks
fn linkify<'a>(text: CowStr<'a>, out: &mut Vec<Event<'a>>) {
    let mut last = 0;
    let mut found = false;

    for candidate in URL_PATTERN.find_iter(&text) {
        let url = trim_url(candidate.as_str());
        if !has_host(url) {
            continue;
        }

        let start = candidate.start();
        if start > last {
            out.push(Event::Text(text[last..start].to_string().into()));
        }

        let href = if url.len() >= 4 && url[..4].eq_ignore_ascii_case("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: href.into(),
            title: "".into(),
            id: "".into(),
        }));
        out.push(Event::Text(url.to_string().into()));
        out.push(Event::End(TagEnd::Link));

        last = start + url.len();
        found = true;
    }

    if !found {
        out.push(Event::Text(text));
    } else if last < text.len() {
        out.push(Event::Text(text[last..].to_string().into()));
    }
}

/// Drop trailing punctuation that belongs to the sentence, not the URL
fn trim_url(candidate: &str) -> &str {
    let mut url = candidate;
    while let Some(last) = url.chars().last() {
        let trim = match last {
            '.' | ',' | ':' | ';' | '!' | '?' | '"' | '\'' => true,
            ')' => url.matches(')').count() > url.matches('(').count(),
            _ => false,
        };
        if !trim {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}

fn has_host(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .or_else(|| lower.strip_prefix("www."))
        .unwrap_or_default();
    !rest.is_empty()
}

fn is_safe_destination(destination: &str) -> bool {
    let lower = destination.trim_start().to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return false;
    }
    if lower.starts_with("data:") {
        return ALLOWED_DATA_IMAGES
            .iter()
            .any(|prefix| lower.starts_with(prefix));
    }
    true
}
