use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod youtube;

/// Upstream-assigned identifier of a recommended item.
///
/// Two items are the same item iff their ids are equal; nothing else about
/// an item takes part in deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Key used by the dedup ledger
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A recommended item returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    /// Human-readable explanation of why the item was picked
    pub reason: Option<String>,
    /// Name of the category feed the item came from
    pub category: String,
}

impl Item {
    pub fn from_raw(raw: RawItem, category: &CategoryProfile) -> Self {
        Item {
            id: ItemId::new(raw.id),
            title: raw.title,
            thumbnail_url: raw.thumbnail_url,
            reason: Some(format!("Popular in {}", category.name)),
            category: category.name.clone(),
        }
    }
}

// ============================================================================
// Upstream Feed Provider boundary types
// ============================================================================

/// Resource kind the feed is expected to carry
pub const VIDEO_KIND: &str = "youtube#video";

/// One item of an upstream page, already parsed out of the raw response
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
}

impl RawItem {
    /// Only video resources can be recommended; channels, playlists and
    /// anything else the feed might interleave are skipped.
    pub fn is_recommendable(&self) -> bool {
        self.kind == VIDEO_KIND && !self.id.is_empty()
    }
}

/// One page of a category feed. `next_cursor = None` ends the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<RawItem>,
    pub next_cursor: Option<String>,
}

/// A category the session draws recommendations from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryProfile {
    /// Display name, e.g. "Music"
    pub name: String,
    /// Key understood by the feed provider, e.g. "10"
    pub upstream_category_key: String,
    /// Relative draw weight (raw engagement count)
    pub weight: f64,
}

/// Identity of the user a session is seeded for
#[derive(Debug, Clone)]
pub struct UserContext {
    /// OAuth bearer token forwarded to the frequency source
    pub access_token: String,
}
