use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    aggregator::{token, Aggregator, SessionState, StreamStatus},
    db::SessionStore,
    error::AppResult,
    models::{Item, UserContext},
};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// One page of the recommendation stream as the web layer sees it
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationPage {
    pub items: Vec<Item>,
    /// Pass back to get the next page; `None` once the stream is finished
    pub next_page_token: Option<String>,
}

impl RecommendationPage {
    fn finished() -> Self {
        Self {
            items: Vec::new(),
            next_page_token: None,
        }
    }
}

/// A session's entry in the lock map, removed on drop once nobody else
/// holds or waits on it. Dropping covers abandoned requests too.
struct SessionLock<'a> {
    locks: &'a LockMap,
    session_id: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> SessionLock<'a> {
    fn register(locks: &'a LockMap, session_id: &'a str) -> Self {
        let lock = locks.entry(session_id.to_string()).or_default().clone();
        Self {
            locks,
            session_id,
            lock,
        }
    }
}

impl Drop for SessionLock<'_> {
    fn drop(&mut self) {
        // The map and this handle are the only owners left
        self.locks.remove_if(self.session_id, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
    }
}

/// Runs the aggregator against stored session state.
///
/// Each request for a session loads its state, advances it and writes it
/// back while holding that session's lock, so rapid repeat requests for one
/// session queue up instead of racing on the same cursors and ledger.
pub struct RecommendationService {
    aggregator: Aggregator,
    store: Arc<dyn SessionStore>,
    locks: LockMap,
}

impl RecommendationService {
    pub fn new(aggregator: Aggregator, store: Arc<dyn SessionStore>) -> Self {
        Self {
            aggregator,
            store,
            locks: DashMap::new(),
        }
    }

    /// Returns the next page of recommendations for a session
    ///
    /// Any accepted page token resumes the stored stream, so a finished
    /// stream stays finished until [`reset`](Self::reset). Sessions with no
    /// stored state are seeded from the user's engagement signal.
    pub async fn next_page(
        &self,
        session_id: &str,
        user: &UserContext,
        page_token: Option<&str>,
        count: usize,
    ) -> AppResult<RecommendationPage> {
        token::validate(page_token)?;

        let registration = SessionLock::register(&self.locks, session_id);
        let _guard = registration.lock.lock().await;
        self.advance(session_id, user, count).await
    }

    /// Drops a session's stored state so its next request starts over
    pub async fn reset(&self, session_id: &str) -> AppResult<()> {
        let registration = SessionLock::register(&self.locks, session_id);
        let _guard = registration.lock.lock().await;
        self.store.remove(session_id).await?;

        tracing::info!(session_id = %session_id, "Recommendation stream reset");
        Ok(())
    }

    async fn advance(
        &self,
        session_id: &str,
        user: &UserContext,
        count: usize,
    ) -> AppResult<RecommendationPage> {
        let stored = match self.store.load(session_id).await? {
            Some(blob) => Some(SessionState::from_blob(&blob)?),
            None => None,
        };

        let status = StreamStatus::of(stored.as_ref(), self.aggregator.settings().policy);
        let state = match (status, stored) {
            (StreamStatus::Exhausted, _) => {
                tracing::debug!(session_id = %session_id, "Stream already finished");
                return Ok(RecommendationPage::finished());
            }
            (_, Some(state)) => state,
            (_, None) => {
                tracing::info!(session_id = %session_id, "Starting recommendation session");
                self.aggregator.start_session(user).await?
            }
        };

        // Saved only once the batch is complete. A request dropped before
        // this point keeps none of its cursor advances.
        let batch = self.aggregator.next_batch(state, count).await;
        self.store.save(session_id, batch.state.to_blob()?).await?;

        Ok(RecommendationPage {
            items: batch.items,
            next_page_token: token::encode(batch.has_more),
        })
    }
}
