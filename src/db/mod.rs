pub mod memory;
pub mod redis;

pub use self::memory::MemorySessionStore;
pub use self::redis::{create_redis_client, RedisSessionStore, SessionKey};

use crate::error::AppResult;

/// Persists each session's serialized recommendation state between requests.
///
/// Blobs are opaque to the store. Callers serialize access per session id;
/// the store only has to make single get/set/remove calls atomic.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> AppResult<Option<String>>;

    async fn save(&self, session_id: &str, blob: String) -> AppResult<()>;

    async fn remove(&self, session_id: &str) -> AppResult<()>;
}
