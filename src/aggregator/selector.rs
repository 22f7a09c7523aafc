use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::StdRng,
    Rng, SeedableRng,
};
use std::{collections::HashMap, sync::Arc};

use super::{weights, AggregatorSettings, SelectionPolicy, SessionState};
use crate::{
    error::{AppError, AppResult},
    models::{CategoryProfile, Item, Page, RawItem, UserContext},
    services::providers::{FeedProvider, FrequencySource},
};

/// Result of one `next_batch` call
#[derive(Debug, Clone)]
pub struct Batch {
    /// Items in the order they were discovered
    pub items: Vec<Item>,
    pub state: SessionState,
    /// `false` is final for this state
    pub has_more: bool,
}

/// Combines several category feeds into one recommendation stream.
///
/// Holds no per-session data: every call takes the session's state by value
/// and hands back the updated state, so one instance serves all sessions.
/// Callers must not run two calls for the same session concurrently.
pub struct Aggregator {
    provider: Arc<dyn FeedProvider>,
    frequencies: Arc<dyn FrequencySource>,
    settings: AggregatorSettings,
}

impl Aggregator {
    pub fn new(
        provider: Arc<dyn FeedProvider>,
        frequencies: Arc<dyn FrequencySource>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            provider,
            frequencies,
            settings,
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Builds a new session from the user's engagement signal.
    ///
    /// A failing or empty signal yields a session with no categories, whose
    /// stream is exhausted from the start. Only an auth failure is returned
    /// as an error, since the user has to sign in again.
    pub async fn start_session(&self, user: &UserContext) -> AppResult<SessionState> {
        let frequencies = match self.frequencies.category_frequencies(user).await {
            Ok(frequencies) => frequencies,
            Err(e @ AppError::Unauthorized(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Frequency source failed, starting session without categories");
                HashMap::new()
            }
        };

        Ok(self.session_from_frequencies(&frequencies))
    }

    pub fn session_from_frequencies(&self, frequencies: &HashMap<String, u64>) -> SessionState {
        let supported = self.provider.supported_categories();
        let profile =
            weights::build_profile(frequencies, self.settings.top_categories, &supported);

        if profile.is_empty() {
            tracing::info!(
                signal_categories = frequencies.len(),
                "No usable categories, recommendations unavailable for this session"
            );
        } else {
            tracing::info!(
                categories = profile.len(),
                provider = self.provider.name(),
                "Recommendation session started"
            );
        }

        SessionState::new(profile, self.settings.ledger_capacity)
    }

    /// Produces the next batch of up to `count` items
    pub async fn next_batch(&self, state: SessionState, count: usize) -> Batch {
        let mut rng = StdRng::from_entropy();
        self.next_batch_with_rng(state, count, &mut rng).await
    }

    pub async fn next_batch_with_rng<R: Rng + Send>(
        &self,
        mut state: SessionState,
        count: usize,
        rng: &mut R,
    ) -> Batch {
        debug_assert!(state.validate().is_ok(), "aggregator handed an invalid session");

        let policy = self.settings.policy;
        if !state.has_more(policy) {
            return Batch {
                items: Vec::new(),
                state,
                has_more: false,
            };
        }

        let items = match policy {
            SelectionPolicy::Weighted => self.weighted_batch(&mut state, count, rng).await,
            SelectionPolicy::RoundRobin => self.round_robin_batch(&mut state).await,
        };
        let has_more = state.has_more(policy);

        tracing::info!(
            policy = ?policy,
            requested = count,
            returned = items.len(),
            seen = state.seen_ids.len(),
            has_more,
            "Recommendation batch assembled"
        );

        Batch {
            items,
            state,
            has_more,
        }
    }

    /// Draws a category per item. A draw that yields nothing removes that
    /// category from the pool for the current item, so each item costs at
    /// most one fetch per remaining category.
    async fn weighted_batch<R: Rng + Send>(
        &self,
        state: &mut SessionState,
        count: usize,
        rng: &mut R,
    ) -> Vec<Item> {
        let mut items = Vec::with_capacity(count);

        while items.len() < count {
            let mut pool: Vec<usize> = state
                .category_profile
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    p.weight > 0.0 && state.cursor_table.is_active(&p.upstream_category_key)
                })
                .map(|(index, _)| index)
                .collect();

            let mut found = None;
            while let Some(drawn) = draw(&state.category_profile, &pool, rng) {
                let category = state.category_profile[pool.swap_remove(drawn)].clone();
                tracing::debug!(category = %category.name, "Category drawn");

                if let Some(item) = self.first_unseen(state, &category).await {
                    found = Some(item);
                    break;
                }
            }

            match found {
                Some(item) => items.push(item),
                None => break,
            }
        }

        items
    }

    /// Fetches the category's next page and takes its first unseen item
    async fn first_unseen(
        &self,
        state: &mut SessionState,
        category: &CategoryProfile,
    ) -> Option<Item> {
        let page = self.fetch_next_page(state, category).await?;

        let item = page
            .items
            .into_iter()
            .filter(RawItem::is_recommendable)
            .map(|raw| Item::from_raw(raw, category))
            .find(|item| !state.seen_ids.contains(&item.id))?;

        state.seen_ids.add(&item.id);
        Some(item)
    }

    /// Returns one full page from the next active category in cycle order
    async fn round_robin_batch(&self, state: &mut SessionState) -> Vec<Item> {
        let len = state.category_profile.len();
        let Some(position) = (0..len)
            .map(|offset| (state.round_robin_index + offset) % len)
            .find(|&i| {
                state
                    .cursor_table
                    .is_active(&state.category_profile[i].upstream_category_key)
            })
        else {
            return Vec::new();
        };

        state.round_robin_index = (position + 1) % len;
        let category = state.category_profile[position].clone();

        let Some(page) = self.fetch_next_page(state, &category).await else {
            return Vec::new();
        };

        let mut items = Vec::with_capacity(page.items.len());
        for item in page
            .items
            .into_iter()
            .filter(RawItem::is_recommendable)
            .map(|raw| Item::from_raw(raw, &category))
        {
            if self.settings.round_robin_dedup {
                if state.seen_ids.contains(&item.id) {
                    continue;
                }
                state.seen_ids.add(&item.id);
            }
            items.push(item);
        }

        items
    }

    /// Fetches the page at the category's cursor and advances the cursor.
    ///
    /// Failures and timeouts leave the cursor untouched and come back as
    /// `None`; only a page without a next cursor exhausts the category.
    async fn fetch_next_page(
        &self,
        state: &mut SessionState,
        category: &CategoryProfile,
    ) -> Option<Page> {
        let key = category.upstream_category_key.as_str();
        let cursor = state
            .cursor_table
            .get_cursor(key)?
            .as_request_token()
            .map(str::to_string);

        let result = match tokio::time::timeout(
            self.settings.fetch_timeout,
            self.provider.fetch_category_top(key, cursor.as_deref()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} feed for category {}",
                self.provider.name(),
                key
            ))),
        };

        match result {
            Ok(page) => {
                tracing::debug!(
                    category = %category.name,
                    items = page.items.len(),
                    has_next = page.next_cursor.is_some(),
                    "Category page fetched"
                );
                state.cursor_table.advance(key, page.next_cursor.clone());
                Some(page)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    category = %category.name,
                    provider = self.provider.name(),
                    "Category fetch failed, treating draw as empty"
                );
                None
            }
        }
    }
}

/// Picks a position in `pool` with probability proportional to weight
fn draw<R: Rng>(profile: &[CategoryProfile], pool: &[usize], rng: &mut R) -> Option<usize> {
    if pool.is_empty() {
        return None;
    }
    let dist = WeightedIndex::new(pool.iter().map(|&i| profile[i].weight)).ok()?;
    Some(dist.sample(rng))
}
