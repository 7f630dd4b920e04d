//! HTML escaping and the trusted-markup newtype

use std::fmt;

/// HTML that is safe to inject without further escaping.
///
/// Only produced by the content pipeline, by escaping plain text, or by
/// other constructors inside this crate. Never escaped a second time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeHtml(String);

impl SafeHtml {
    /// Wrap markup produced by this crate's own renderers
    pub(crate) fn trusted(markup: String) -> Self {
        Self(markup)
    }

    /// Empty fragment
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Escape plain text into a safe fragment
    #[must_use]
    pub fn escape(text: &str) -> Self {
        Self(escape_text(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape text for use between tags
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for use inside a double-quoted attribute value
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
