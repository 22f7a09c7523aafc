use std::sync::Arc;
use std::time::Duration;

use feed_mixer::{
    aggregator::Aggregator,
    api::{create_router, AppState, BatchLimits},
    config::Config,
    db::{create_redis_client, MemorySessionStore, RedisSessionStore, SessionStore},
    services::{providers::youtube::YouTubeProvider, RecommendationService},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("feed_mixer=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let provider = Arc::new(YouTubeProvider::new(
        config.youtube_api_key.clone(),
        config.youtube_api_url.clone(),
        config.region_code.clone(),
        config.clamped_page_size(),
        config.max_liked_pages,
        Duration::from_millis(config.fetch_timeout_ms),
    )?);

    let store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(redis_url) => {
            tracing::info!("Storing sessions in Redis");
            Arc::new(RedisSessionStore::new(
                create_redis_client(redis_url)?,
                config.session_ttl_secs,
            ))
        }
        None => {
            tracing::warn!("REDIS_URL not set, storing sessions in process memory");
            Arc::new(MemorySessionStore::new(config.session_ttl()))
        }
    };

    let aggregator = Aggregator::new(provider.clone(), provider, config.aggregator_settings());
    let state = AppState::new(
        RecommendationService::new(aggregator, store),
        BatchLimits {
            default_batch_size: config.default_batch_size,
            max_batch_size: config.max_batch_size,
        },
    );

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, policy = ?config.selection_policy, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
