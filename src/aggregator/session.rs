use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{cursor::CursorTable, ledger::DedupLedger, SelectionPolicy};
use crate::{
    error::{AppError, AppResult},
    models::CategoryProfile,
};

/// Where a session stands in the recommendation stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// No state stored yet for the session
    Uninitialized,
    Active,
    /// Profile empty or every usable category exhausted. Terminal.
    Exhausted,
}

impl StreamStatus {
    pub fn of(state: Option<&SessionState>, policy: SelectionPolicy) -> Self {
        match state {
            None => StreamStatus::Uninitialized,
            Some(state) if state.has_more(policy) => StreamStatus::Active,
            Some(_) => StreamStatus::Exhausted,
        }
    }
}

/// Everything the aggregator needs to resume a session's stream.
///
/// Passed into and returned from every aggregator call, and persisted
/// between requests as an opaque blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub created_at: DateTime<Utc>,
    pub category_profile: Vec<CategoryProfile>,
    pub cursor_table: CursorTable,
    pub round_robin_index: usize,
    pub seen_ids: DedupLedger,
}

impl SessionState {
    pub fn new(category_profile: Vec<CategoryProfile>, ledger_capacity: usize) -> Self {
        let cursor_table = CursorTable::new(&category_profile);
        Self {
            created_at: Utc::now(),
            category_profile,
            cursor_table,
            round_robin_index: 0,
            seen_ids: DedupLedger::new(ledger_capacity),
        }
    }

    /// Whether another call can still produce items under `policy`.
    ///
    /// The weighted policy never draws zero-weight categories, so those do
    /// not keep a weighted stream alive.
    pub fn has_more(&self, policy: SelectionPolicy) -> bool {
        match policy {
            SelectionPolicy::Weighted => self.category_profile.iter().any(|p| {
                p.weight > 0.0 && self.cursor_table.is_active(&p.upstream_category_key)
            }),
            SelectionPolicy::RoundRobin => self.cursor_table.any_active(),
        }
    }

    /// Checks the structural invariants a well-formed state always holds
    pub fn validate(&self) -> AppResult<()> {
        let profile_keys: BTreeSet<&str> = self
            .category_profile
            .iter()
            .map(|p| p.upstream_category_key.as_str())
            .collect();
        if profile_keys.len() != self.category_profile.len() {
            return Err(AppError::InvariantViolation(
                "duplicate category key in profile".to_string(),
            ));
        }

        let cursor_keys: BTreeSet<&str> = self.cursor_table.keys().collect();
        if profile_keys != cursor_keys {
            return Err(AppError::InvariantViolation(format!(
                "cursor table keys {:?} diverge from profile keys {:?}",
                cursor_keys, profile_keys
            )));
        }

        if let Some(bad) = self
            .category_profile
            .iter()
            .find(|p| !p.weight.is_finite() || p.weight < 0.0)
        {
            return Err(AppError::InvariantViolation(format!(
                "category {} has invalid weight {}",
                bad.name, bad.weight
            )));
        }

        if self.seen_ids.len() > self.seen_ids.capacity() {
            return Err(AppError::InvariantViolation(format!(
                "seen ledger holds {} ids over capacity {}",
                self.seen_ids.len(),
                self.seen_ids.capacity()
            )));
        }

        if !self.category_profile.is_empty()
            && self.round_robin_index >= self.category_profile.len()
        {
            return Err(AppError::InvariantViolation(format!(
                "round robin index {} out of range for {} categories",
                self.round_robin_index,
                self.category_profile.len()
            )));
        }

        Ok(())
    }

    /// Serializes the state for the session store
    pub fn to_blob(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(format!("Session serialization error: {}", e)))
    }

    /// Restores a state written by [`SessionState::to_blob`], rejecting
    /// blobs whose invariants do not hold
    pub fn from_blob(blob: &str) -> AppResult<Self> {
        let state: SessionState = serde_json::from_str(blob).map_err(|e| {
            AppError::InvariantViolation(format!("Session deserialization error: {}", e))
        })?;
        state.validate()?;
        Ok(state)
    }
}
