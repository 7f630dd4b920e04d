//! Invite map - guild name to invite link

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from guild name to invite URL.
///
/// Fetched once per session and never mutated by message traffic. Guilds
/// iterate in sorted name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteMap(BTreeMap<String, String>);

impl InviteMap {
    /// Create an empty invite map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invite URL for a guild, if one is known
    pub fn get(&self, guild: &str) -> Option<&str> {
        self.0.get(guild).map(String::as_str)
    }

    /// Check if a guild is known
    pub fn contains(&self, guild: &str) -> bool {
        self.0.contains_key(guild)
    }

    /// Known guild names, sorted
    pub fn guilds(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Guild/invite pairs, sorted by guild name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for InviteMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
