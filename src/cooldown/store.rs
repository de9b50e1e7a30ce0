//! Cooldown record storage interface and implementations
//!
//! One record per (server, user) pair. The periodic sweeper uses
//! `delete_expired` to drop records that are already past their effective
//! expiry; that is safe to run concurrently with gate reads and writes.

use crate::cooldown::gate::effective_expiry;
use crate::error::{Result, WarRoomError};
use crate::types::{CooldownRecord, ServerId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for cooldown record storage operations
#[async_trait]
pub trait CooldownStore: Send + Sync {
    /// Get the record for a (server, user) pair
    async fn get(&self, server_id: &ServerId, user_id: &UserId) -> Result<Option<CooldownRecord>>;

    /// Insert or replace the record for its (server, user) pair
    async fn upsert(&self, record: CooldownRecord) -> Result<()>;

    /// Delete a record; returns whether one existed
    async fn delete(&self, server_id: &ServerId, user_id: &UserId) -> Result<bool>;

    /// Delete every record whose effective expiry is at or before `now`;
    /// returns how many were removed
    async fn delete_expired(&self, now: DateTime<Utc>, window: Duration) -> Result<usize>;

    /// Get total number of stored records
    async fn record_count(&self) -> Result<usize>;
}

/// In-memory cooldown store implementation
#[derive(Debug, Default)]
pub struct InMemoryCooldownStore {
    records: RwLock<HashMap<(ServerId, UserId), CooldownRecord>>,
}

impl InMemoryCooldownStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CooldownStore for InMemoryCooldownStore {
    async fn get(&self, server_id: &ServerId, user_id: &UserId) -> Result<Option<CooldownRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire cooldown read lock".to_string(),
            })?;

        Ok(records
            .get(&(server_id.clone(), user_id.clone()))
            .cloned())
    }

    async fn upsert(&self, record: CooldownRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire cooldown write lock".to_string(),
            })?;

        records.insert(
            (record.server_id.clone(), record.user_id.clone()),
            record,
        );
        Ok(())
    }

    async fn delete(&self, server_id: &ServerId, user_id: &UserId) -> Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire cooldown write lock".to_string(),
            })?;

        Ok(records
            .remove(&(server_id.clone(), user_id.clone()))
            .is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>, window: Duration) -> Result<usize> {
        let mut records = self
            .records
            .write()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire cooldown write lock".to_string(),
            })?;

        let before = records.len();
        records.retain(|_, record| match effective_expiry(record, window, now) {
            Some(expiry) => expiry > now,
            None => false,
        });

        Ok(before - records.len())
    }

    async fn record_count(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire cooldown read lock".to_string(),
            })?;

        Ok(records.len())
    }
}
