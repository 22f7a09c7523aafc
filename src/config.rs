use serde::Deserialize;
use std::time::Duration;

use crate::aggregator::{AggregatorSettings, SelectionPolicy};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// YouTube Data API key, used for public chart lookups
    pub youtube_api_key: String,

    /// YouTube Data API base URL
    #[serde(default = "default_youtube_api_url")]
    pub youtube_api_url: String,

    /// Region the popular charts are requested for
    #[serde(default = "default_region_code")]
    pub region_code: String,

    /// Redis connection URL. Sessions live in process memory when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// How categories are chosen for each batch
    #[serde(default)]
    pub selection_policy: SelectionPolicy,

    /// Whether round-robin batches are filtered against the seen-id ledger
    #[serde(default)]
    pub round_robin_dedup: bool,

    /// Maximum number of delivered ids remembered per session
    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,

    /// Number of most-liked categories kept in a session's profile
    #[serde(default = "default_top_categories")]
    pub top_categories: usize,

    /// Items requested per upstream page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Timeout for a single upstream page fetch, in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Idle lifetime of a stored session, in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Upper bound on liked-video pages scanned when seeding a session
    #[serde(default = "default_max_liked_pages")]
    pub max_liked_pages: usize,

    /// Batch size used when the caller does not ask for one
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,

    /// Largest batch a caller may request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_youtube_api_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_region_code() -> String {
    "US".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_ledger_capacity() -> usize {
    500
}

fn default_top_categories() -> usize {
    5
}

fn default_page_size() -> u32 {
    10
}

fn default_fetch_timeout_ms() -> u64 {
    5000
}

fn default_session_ttl_secs() -> u64 {
    3600
}

fn default_max_liked_pages() -> usize {
    10
}

fn default_batch_size() -> usize {
    6
}

fn default_max_batch_size() -> usize {
    50
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// YouTube caps `maxResults` at 50
    pub fn clamped_page_size(&self) -> u32 {
        self.page_size.clamp(1, 50)
    }

    /// A ledger has to remember at least one id to deduplicate anything
    pub fn clamped_ledger_capacity(&self) -> usize {
        self.ledger_capacity.max(1)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            policy: self.selection_policy,
            round_robin_dedup: self.round_robin_dedup,
            ledger_capacity: self.clamped_ledger_capacity(),
            top_categories: self.top_categories,
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
        }
    }
}
