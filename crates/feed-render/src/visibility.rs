//! Per-guild visibility rules
//!
//! Hiding a guild inserts one `display: none` rule for its class token.
//! Rendered nodes are never modified; visibility is answered by matching a
//! node's class list against the active rules.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dom::Element;

/// Prefix of every guild class token
pub const CLASS_PREFIX: &str = "g-";

/// Escape a guild name into characters valid in a CSS class or element id.
///
/// ASCII alphanumerics and `-` are kept; every other UTF-8 byte becomes
/// `_xx` (lowercase hex), so distinct names never collide.
pub fn escape_name(guild: &str) -> String {
    let mut out = String::with_capacity(guild.len());
    for byte in guild.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "_{byte:02x}");
        }
    }
    out
}

/// Class token carried by every message of `guild`
pub fn class_token(guild: &str) -> String {
    format!("{CLASS_PREFIX}{}", escape_name(guild))
}

/// Hide rules keyed by guild.
///
/// Cloning yields another handle to the same rule set.
#[derive(Debug, Clone, Default)]
pub struct VisibilityFilter {
    /// class token -> guild name, one entry per hidden guild
    rules: Arc<RwLock<BTreeMap<String, String>>>,
}

impl VisibilityFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide or show a guild. Returns `true` if the rule set changed.
    pub fn set_hidden(&self, guild: &str, hidden: bool) -> bool {
        let token = class_token(guild);
        let mut rules = self.rules.write();

        let changed = if hidden {
            rules.insert(token, guild.to_string()).is_none()
        } else {
            rules.remove(&token).is_some()
        };

        if changed {
            tracing::debug!(guild = %guild, hidden, "Visibility changed");
        }
        changed
    }

    /// Check if a guild is currently hidden
    pub fn is_hidden(&self, guild: &str) -> bool {
        self.rules.read().contains_key(&class_token(guild))
    }

    /// Check if any active rule matches the element's class list
    pub fn hides(&self, element: &Element) -> bool {
        let rules = self.rules.read();
        if rules.is_empty() {
            return false;
        }
        element.class_list().any(|class| rules.contains_key(class))
    }

    /// Number of active rules
    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    /// Names of hidden guilds, sorted by class token
    pub fn hidden_guilds(&self) -> Vec<String> {
        self.rules.read().values().cloned().collect()
    }

    /// Render the active rules as CSS
    pub fn stylesheet(&self) -> String {
        self.rules
            .read()
            .keys()
            .fold(String::new(), |mut css, token| {
                let _ = writeln!(css, ".{token} {{ display: none; }}");
                css
            })
    }
}
