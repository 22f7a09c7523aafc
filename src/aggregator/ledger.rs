use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::models::ItemId;

/// Bounded record of item ids already delivered in a session.
///
/// Eviction is FIFO on insertion order: re-adding an id that is still in
/// the ledger does not refresh its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupLedger {
    capacity: usize,
    ids: IndexSet<String>,
}

impl DedupLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ids: IndexSet::with_capacity(capacity.min(1024)),
        }
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id.as_str())
    }

    /// Records `id`, evicting the oldest entry when the ledger is full
    pub fn add(&mut self, id: &ItemId) {
        if self.capacity == 0 || self.ids.contains(id.as_str()) {
            return;
        }

        if self.ids.len() >= self.capacity {
            self.ids.shift_remove_index(0);
        }
        self.ids.insert(id.as_str().to_string());
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ids from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
