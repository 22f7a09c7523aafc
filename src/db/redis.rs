use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use super::SessionStore;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Recommendations(String),
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKey::Recommendations(id) => write!(f, "feed:session:{}", id),
        }
    }
}

/// Creates a Redis client for session storage
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Session store backed by Redis, one key per session with a sliding TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_client: Client,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(redis_client: Client, ttl_secs: u64) -> Self {
        Self {
            redis_client,
            ttl_secs,
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> AppResult<Option<String>> {
        let key = SessionKey::Recommendations(session_id.to_string());
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let blob: Option<String> = conn.get(key.to_string()).await.map_err(|e| {
            tracing::warn!(error = %e, "Redis get failed");
            e
        })?;
        Ok(blob)
    }

    async fn save(&self, session_id: &str, blob: String) -> AppResult<()> {
        let key = SessionKey::Recommendations(session_id.to_string());
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(key.to_string(), blob, self.ttl_secs)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Redis set failed");
                e
            })?;

        tracing::debug!(key = %key, ttl = self.ttl_secs, "Session state stored");
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> AppResult<()> {
        let key = SessionKey::Recommendations(session_id.to_string());
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key.to_string()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::Recommendations("3f2a".to_string());
        assert_eq!(format!("{}", key), "feed:session:3f2a");
    }

    #[test]
    fn test_create_redis_client_rejects_bad_url() {
        assert!(create_redis_client("not a url").is_err());
    }

    // Needs a live Redis; skipped unless REDIS_URL is set
    #[tokio::test]
    async fn test_save_load_remove() {
        let Ok(redis_url) = std::env::var("REDIS_URL") else {
            return;
        };

        let client = create_redis_client(&redis_url).unwrap();
        let store = RedisSessionStore::new(client, 60);

        store.save("redis-test", "{}".to_string()).await.unwrap();
        assert_eq!(store.load("redis-test").await.unwrap(), Some("{}".to_string()));

        store.remove("redis-test").await.unwrap();
        assert_eq!(store.load("redis-test").await.unwrap(), None);
    }
}
