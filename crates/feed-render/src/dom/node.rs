//! Detached element tree and the `h` builder

use std::fmt;
use std::sync::Arc;

use crate::html::{escape_attr, escape_text, SafeHtml};
use crate::visibility::escape_name;

/// Attribute key whose value becomes the element's inner HTML
pub const HTML_KEY: &str = "html";

/// Prefix marking an attribute as an event handler (`onchange` -> `change`)
pub const HANDLER_PREFIX: &str = "on";

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Event handler attached to an element
pub type Handler = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// Event delivered to element handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: String,
    /// State of the target checkbox, for `change` events
    pub checked: Option<bool>,
}

impl DomEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            checked: None,
        }
    }

    /// Change event from a checkbox
    pub fn change(checked: bool) -> Self {
        Self {
            kind: "change".to_string(),
            checked: Some(checked),
        }
    }
}

/// Attribute value passed to [`h`]
#[derive(Clone)]
pub enum AttrValue {
    Text(String),
    Markup(SafeHtml),
    Handler(Handler),
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Markup(markup) => f.debug_tuple("Markup").field(markup).finish(),
            Self::Handler(_) => f.write_str("Handler"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<SafeHtml> for AttrValue {
    fn from(value: SafeHtml) -> Self {
        Self::Markup(value)
    }
}

impl From<Handler> for AttrValue {
    fn from(value: Handler) -> Self {
        Self::Handler(value)
    }
}

/// Wrap a closure as a handler attribute value
pub fn handler<F>(f: F) -> AttrValue
where
    F: Fn(&DomEvent) + Send + Sync + 'static,
{
    AttrValue::Handler(Arc::new(f))
}

/// Document node
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Plain text, escaped on serialization
    Text(String),
    /// Trusted markup, written as-is
    Markup(SafeHtml),
}

/// Element node
#[derive(Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    listeners: Vec<(String, Handler)>,
}

/// Build a detached element.
///
/// `html` injects trusted markup as inner HTML, `on<event>` registers a
/// handler, and every other key becomes an attribute. Children are appended
/// in order after any injected markup.
pub fn h<'a, A, C>(tag: &str, attrs: A, children: C) -> Node
where
    A: IntoIterator<Item = (&'a str, AttrValue)>,
    C: IntoIterator<Item = Node>,
{
    let mut element = Element::new(tag);

    for (key, value) in attrs {
        if key == HTML_KEY {
            match value {
                AttrValue::Markup(markup) => element.children.push(Node::Markup(markup)),
                // untrusted text is never injected as markup
                AttrValue::Text(text) => element.children.push(Node::Text(text)),
                AttrValue::Handler(_) => {
                    tracing::warn!(tag = %tag, "Ignoring handler under the html key");
                }
            }
        } else if let Some(event) = key.strip_prefix(HANDLER_PREFIX).filter(|e| !e.is_empty()) {
            match value {
                AttrValue::Handler(f) => element.add_listener(event, f),
                other => {
                    tracing::warn!(tag = %tag, key = %key, value = ?other, "Dropping non-handler event attribute");
                }
            }
        } else {
            match value {
                AttrValue::Text(text) => element.set_attr(key, text),
                AttrValue::Markup(markup) => element.set_attr(key, markup.into_string()),
                AttrValue::Handler(_) => {
                    tracing::warn!(tag = %tag, key = %key, "Dropping handler under a plain attribute");
                }
            }
        }
    }

    element.children.extend(children);
    Node::Element(element)
}

/// Checked checkbox with a label, firing `onchange` when toggled
pub fn checkbox(name: &str, onchange: Handler) -> Node {
    let id = checkbox_id(name);
    h(
        "div",
        [],
        [
            h(
                "input",
                [
                    ("type", "checkbox".into()),
                    ("id", id.clone().into()),
                    ("checked", "".into()),
                    ("onchange", onchange.into()),
                ],
                [],
            ),
            h("label", [("for", id.into())], [Node::text(name)]),
        ],
    )
}

/// Element id of the checkbox created for `name`
pub fn checkbox_id(name: &str) -> String {
    format!("checkbox-{}", escape_name(name))
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn into_element(self) -> Option<Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Run handlers for the event; text nodes have none
    pub fn dispatch(&self, event: &DomEvent) -> usize {
        self.as_element().map_or(0, |element| element.dispatch(event))
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn class_list(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().any(|c| c == class)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn append(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn prepend(&mut self, node: Node) {
        self.children.insert(0, node);
    }

    /// Remove every child
    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Element(element) => element.collect_text(out),
                Node::Text(text) => out.push_str(text),
                Node::Markup(_) => {}
            }
        }
    }

    /// Depth-first search for a descendant (or self) with the given id
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.attr("id") == Some(id) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| child.find_by_id(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.attr("id") == Some(id) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|child| child.find_by_id_mut(id))
    }

    /// First descendant carrying `class`
    pub fn find_by_class(&self, class: &str) -> Option<&Element> {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| {
                if child.has_class(class) {
                    Some(child)
                } else {
                    child.find_by_class(class)
                }
            })
    }

    pub fn add_listener(&mut self, event: &str, handler: Handler) {
        self.listeners.push((event.to_string(), handler));
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.listeners.iter().filter(|(kind, _)| kind == event).count()
    }

    /// Run this element's handlers for the event in registration order.
    /// Returns the number of handlers run.
    pub fn dispatch(&self, event: &DomEvent) -> usize {
        let mut count = 0;
        for (_, handler) in self.listeners.iter().filter(|(kind, _)| *kind == event.kind) {
            handler(event);
            count += 1;
        }
        count
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("children", &self.children)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (key, value) in &self.attrs {
            if value.is_empty() {
                write!(f, " {key}")?;
            } else {
                write!(f, " {key}=\"{}\"", escape_attr(value))?;
            }
        }
        f.write_str(">")?;

        if self.is_void() {
            return Ok(());
        }
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.tag)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(element) => fmt::Display::fmt(element, f),
            Self::Text(text) => f.write_str(&escape_text(text)),
            Self::Markup(markup) => f.write_str(markup.as_str()),
        }
    }
}
