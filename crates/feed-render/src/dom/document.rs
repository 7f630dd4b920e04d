//! The feed page: status line, guild toggles, and the message list

use std::fmt::Write;

use super::node::{checkbox_id, h, DomEvent, Element, Node};
use crate::html::SafeHtml;
use crate::visibility::VisibilityFilter;

/// Element id of the connection status line
pub const CONNECTION_STATUS_ID: &str = "connection-status";

const BASE_STYLE: &str = "\
body { background: #36393f; color: #dcddde; font-family: sans-serif; }
.message { border-bottom: 1px solid #4f545c; padding: 8px 0; }
.message .guild, .message .channel { color: #b9bbbe; margin-right: 8px; }
.author { display: flex; align-items: center; gap: 8px; }
.avatar { width: 40px; height: 40px; border-radius: 50%; }
.name { font-weight: bold; }
.message img, .message video { max-width: 400px; }
";

/// Feed page.
///
/// Messages are kept newest first. Visibility is never stored on message
/// nodes; it is evaluated against the filter's rules.
#[derive(Debug)]
pub struct Document {
    title: String,
    code_style: String,
    filter: VisibilityFilter,
    status: Element,
    toggles: Element,
    messages: Element,
}

impl Document {
    #[must_use]
    pub fn new(title: impl Into<String>, filter: VisibilityFilter) -> Self {
        let mut status = Element::new("div");
        status.set_attr("id", CONNECTION_STATUS_ID);

        let mut toggles = Element::new("form");
        toggles.set_attr("class", "toggles");

        let mut messages = Element::new("div");
        messages.set_attr("class", "messages");

        Self {
            title: title.into(),
            code_style: String::new(),
            filter,
            status,
            toggles,
            messages,
        }
    }

    /// Append CSS for highlighted code blocks to the page stylesheet
    #[must_use]
    pub fn with_code_style(mut self, css: impl Into<String>) -> Self {
        self.code_style = css.into();
        self
    }

    pub fn filter(&self) -> &VisibilityFilter {
        &self.filter
    }

    /// Replace the status line text
    pub fn set_status(&mut self, text: &str) {
        self.status.clear();
        self.status.append(Node::text(text));
    }

    pub fn status(&self) -> String {
        self.status.text_content()
    }

    /// Replace the toggle form contents
    pub fn set_toggles(&mut self, toggles: impl IntoIterator<Item = Node>) {
        self.toggles.clear();
        for toggle in toggles {
            self.toggles.append(toggle);
        }
    }

    pub fn toggle_count(&self) -> usize {
        self.toggles.children().len()
    }

    /// Insert a message above all existing ones
    pub fn prepend_message(&mut self, message: Node) {
        self.messages.prepend(message);
    }

    pub fn message_count(&self) -> usize {
        self.messages.children().len()
    }

    /// Messages, newest first
    pub fn messages(&self) -> &[Node] {
        self.messages.children()
    }

    /// Check a message's visibility; index 0 is the topmost (newest) message
    pub fn is_message_visible(&self, index: usize) -> Option<bool> {
        let node = self.messages.children().get(index)?;
        Some(node.as_element().map_or(true, |element| !self.filter.hides(element)))
    }

    /// Number of messages not suppressed by a hide rule
    pub fn visible_message_count(&self) -> usize {
        self.messages
            .children()
            .iter()
            .filter_map(Node::as_element)
            .filter(|element| !self.filter.hides(element))
            .count()
    }

    /// State of a guild's checkbox, `None` if the guild has no toggle
    pub fn is_checked(&self, guild: &str) -> Option<bool> {
        self.toggles
            .find_by_id(&checkbox_id(guild))
            .map(|input| input.has_attr("checked"))
    }

    /// Set a guild's checkbox and fire its change handlers.
    ///
    /// Returns `false` if the guild has no toggle.
    pub fn dispatch_toggle(&mut self, guild: &str, checked: bool) -> bool {
        let Some(input) = self.toggles.find_by_id_mut(&checkbox_id(guild)) else {
            return false;
        };

        if checked {
            input.set_attr("checked", "");
        } else {
            input.remove_attr("checked");
        }
        input.dispatch(&DomEvent::change(checked));
        true
    }

    /// Serialize the whole page
    pub fn render(&self) -> String {
        let head = h(
            "head",
            [],
            [
                h("meta", [("charset", "utf-8".into())], []),
                h("title", [], [Node::text(&self.title)]),
                h(
                    "style",
                    [],
                    [Node::Markup(SafeHtml::trusted(format!("{BASE_STYLE}{}", self.code_style)))],
                ),
                h(
                    "style",
                    [("id", "visibility-rules".into())],
                    [Node::Markup(SafeHtml::trusted(self.filter.stylesheet()))],
                ),
            ],
        );

        let mut page = String::from("<!DOCTYPE html>\n<html>");
        let _ = write!(
            page,
            "{head}<body>{}{}{}</body></html>\n",
            self.status, self.toggles, self.messages
        );
        page
    }
}
