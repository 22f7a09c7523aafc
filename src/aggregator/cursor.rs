use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::CategoryProfile;

/// Pagination position within one category feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "cursor", rename_all = "snake_case")]
pub enum FeedCursor {
    /// Not fetched yet
    Start,
    /// Opaque upstream token for the next page
    Page(String),
    /// No further pages. Terminal.
    Exhausted,
}

impl FeedCursor {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, FeedCursor::Exhausted)
    }

    /// Token to hand the provider, `None` for the first page
    pub fn as_request_token(&self) -> Option<&str> {
        match self {
            FeedCursor::Page(token) => Some(token),
            FeedCursor::Start | FeedCursor::Exhausted => None,
        }
    }
}

/// Per-category cursors, keyed by upstream category key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CursorTable {
    entries: BTreeMap<String, FeedCursor>,
}

impl CursorTable {
    pub fn new(profile: &[CategoryProfile]) -> Self {
        let entries = profile
            .iter()
            .map(|p| (p.upstream_category_key.clone(), FeedCursor::Start))
            .collect();
        Self { entries }
    }

    pub fn get_cursor(&self, category_key: &str) -> Option<&FeedCursor> {
        self.entries.get(category_key)
    }

    /// Moves a category forward after a successful fetch.
    ///
    /// `next = None` means the provider reported the end of the feed.
    /// Exhausted entries never move again.
    pub fn advance(&mut self, category_key: &str, next: Option<String>) {
        let Some(entry) = self.entries.get_mut(category_key) else {
            tracing::error!(category = %category_key, "Advance requested for unknown category");
            return;
        };

        if entry.is_exhausted() {
            return;
        }

        *entry = match next {
            Some(token) => FeedCursor::Page(token),
            None => {
                tracing::info!(category = %category_key, "Category feed exhausted");
                FeedCursor::Exhausted
            }
        };
    }

    pub fn is_active(&self, category_key: &str) -> bool {
        self.entries
            .get(category_key)
            .is_some_and(|cursor| !cursor.is_exhausted())
    }

    pub fn any_active(&self) -> bool {
        self.entries.values().any(|cursor| !cursor.is_exhausted())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
