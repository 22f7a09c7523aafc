use moka::future::Cache;
use std::time::Duration;

use super::SessionStore;
use crate::error::AppResult;

/// In-process session store. Entries expire after `ttl` without access.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<String, String>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder().time_to_idle(ttl).build(),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> AppResult<Option<String>> {
        Ok(self.sessions.get(session_id).await)
    }

    async fn save(&self, session_id: &str, blob: String) -> AppResult<()> {
        self.sessions.insert(session_id.to_string(), blob).await;
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> AppResult<()> {
        self.sessions.invalidate(session_id).await;
        Ok(())
    }
}
