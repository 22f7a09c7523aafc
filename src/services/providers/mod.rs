//! Upstream recommendation sources
//!
//! The aggregator only ever sees these two traits. Network details, auth
//! and response parsing stay inside the implementations, which hand back
//! already-typed [`Page`]s and frequency maps.
use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{Page, UserContext},
};

pub mod youtube;

/// Paginated per-category feed of ranked items
#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    /// Fetch one page of a category's feed
    ///
    /// `cursor = None` requests the first page. The returned page's
    /// `next_cursor` is `None` once the feed has no further pages.
    async fn fetch_category_top(&self, category_key: &str, cursor: Option<&str>)
        -> AppResult<Page>;

    /// Category names this provider can serve, mapped to their upstream keys
    fn supported_categories(&self) -> HashMap<String, String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Per-user engagement signal used once to seed a session's categories
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FrequencySource: Send + Sync {
    /// Count of engaged items per category name
    async fn category_frequencies(&self, user: &UserContext) -> AppResult<HashMap<String, u64>>;
}
