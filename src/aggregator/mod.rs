//! Deduplicated, weighted recommendation stream assembled from several
//! independently paginated category feeds.
use serde::Deserialize;
use std::time::Duration;

pub mod cursor;
pub mod ledger;
pub mod selector;
pub mod session;
pub mod token;
pub mod weights;

pub use cursor::{CursorTable, FeedCursor};
pub use ledger::DedupLedger;
pub use selector::{Aggregator, Batch};
pub use session::{SessionState, StreamStatus};

/// How the aggregator picks which category feeds a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// One weighted category draw per output item, deduplicated against
    /// everything the session has already delivered
    #[default]
    Weighted,
    /// One full page per call, cycling through the categories in order
    RoundRobin,
}

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub policy: SelectionPolicy,
    /// Filter round-robin pages against the seen-id ledger
    pub round_robin_dedup: bool,
    pub ledger_capacity: usize,
    pub top_categories: usize,
    pub fetch_timeout: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::Weighted,
            round_robin_dedup: false,
            ledger_capacity: 500,
            top_categories: 5,
            fetch_timeout: Duration::from_secs(5),
        }
    }
}
