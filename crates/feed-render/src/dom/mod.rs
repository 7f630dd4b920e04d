//! Headless document model
//!
//! A small element tree standing in for the browser DOM: nodes are built
//! detached with [`h`], attached to a [`Document`], and serialized to HTML.

mod document;
mod node;

pub use document::{Document, CONNECTION_STATUS_ID};
pub use node::{
    checkbox, checkbox_id, h, handler, AttrValue, DomEvent, Element, Handler, Node, HANDLER_PREFIX,
    HTML_KEY,
};
