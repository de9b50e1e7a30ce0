//! Match record storage with conditional status updates
//!
//! Status-bearing transitions go through `update_status`, an atomic
//! compare-and-swap on the current status. Concurrent duplicate decisions
//! resolve to exactly one winner; the loser observes a
//! `ConcurrentModification` error and must not retry.

use crate::error::{Result, WarRoomError};
use crate::types::{EntityId, MatchId, MatchRecord, MatchStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// New values applied together with a status change
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: MatchStatus,
    /// Replaces the stored winner reference
    pub winner: Option<EntityId>,
    /// Replaces the stored dodger reference
    pub dodged_by: Option<EntityId>,
}

/// Trait for match record storage operations
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Get a match by ID
    async fn get_match(&self, id: MatchId) -> Result<Option<MatchRecord>>;

    /// Insert a newly created match
    async fn insert_match(&self, record: MatchRecord) -> Result<()>;

    /// Atomically transition a match's status
    ///
    /// The change is applied only if the stored status equals `expected`.
    /// Fails with `MatchNotFound` if the match does not exist and
    /// `ConcurrentModification` if the status no longer matches.
    async fn update_status(
        &self,
        id: MatchId,
        expected: MatchStatus,
        change: StatusChange,
        now: DateTime<Utc>,
    ) -> Result<MatchRecord>;

    /// Get total number of stored matches
    async fn match_count(&self) -> Result<usize>;

    /// Count matches currently awaiting a decision
    async fn open_match_count(&self) -> Result<usize>;
}

/// In-memory match store implementation
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    matches: RwLock<HashMap<MatchId, MatchRecord>>,
}

impl InMemoryMatchStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn get_match(&self, id: MatchId) -> Result<Option<MatchRecord>> {
        let matches = self
            .matches
            .read()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire matches read lock".to_string(),
            })?;

        Ok(matches.get(&id).cloned())
    }

    async fn insert_match(&self, record: MatchRecord) -> Result<()> {
        let mut matches = self
            .matches
            .write()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire matches write lock".to_string(),
            })?;

        matches.insert(record.id, record);
        Ok(())
    }

    async fn update_status(
        &self,
        id: MatchId,
        expected: MatchStatus,
        change: StatusChange,
        now: DateTime<Utc>,
    ) -> Result<MatchRecord> {
        let mut matches = self
            .matches
            .write()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire matches write lock".to_string(),
            })?;

        // Compare and swap under one write lock
        let record = matches
            .get_mut(&id)
            .ok_or_else(|| WarRoomError::MatchNotFound {
                match_id: id.to_string(),
            })?;

        if record.status != expected {
            return Err(WarRoomError::ConcurrentModification {
                match_id: id.to_string(),
            }
            .into());
        }

        record.status = change.status;
        record.winner = change.winner;
        record.dodged_by = change.dodged_by;
        record.updated_at = now;

        Ok(record.clone())
    }

    async fn match_count(&self) -> Result<usize> {
        let matches = self
            .matches
            .read()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire matches read lock".to_string(),
            })?;

        Ok(matches.len())
    }

    async fn open_match_count(&self) -> Result<usize> {
        let matches = self
            .matches
            .read()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire matches read lock".to_string(),
            })?;

        Ok(matches
            .values()
            .filter(|m| m.status.is_decision_source())
            .count())
    }
}
