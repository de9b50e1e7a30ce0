//! Rating storage interface and implementations
//!
//! This module defines the interface for persisting and retrieving entity
//! profiles, with an in-memory implementation and a call-recording variant
//! for tests.

use crate::error::{Result, WarRoomError};
use crate::types::{EntityId, EntityProfile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Trait for entity profile storage operations
///
/// `store_profiles` must apply the whole batch atomically; match
/// finalization relies on both participants landing together.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Get an entity's profile
    async fn get_profile(&self, entity_id: &EntityId) -> Result<Option<EntityProfile>>;

    /// Store or update a single profile
    async fn store_profile(&self, profile: EntityProfile) -> Result<()>;

    /// Store multiple profile updates atomically
    async fn store_profiles(&self, profiles: Vec<EntityProfile>) -> Result<()>;

    /// Remove an entity's profile
    async fn remove_profile(&self, entity_id: &EntityId) -> Result<bool>;

    /// Get the highest-rated profiles (for leaderboards)
    async fn top_profiles(&self, limit: usize) -> Result<Vec<EntityProfile>>;

    /// Get total number of stored profiles
    async fn profile_count(&self) -> Result<usize>;
}

/// In-memory rating store implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
    profiles: RwLock<HashMap<EntityId, EntityProfile>>,
}

impl InMemoryRatingStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RatingStore for InMemoryRatingStore {
    async fn get_profile(&self, entity_id: &EntityId) -> Result<Option<EntityProfile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire profiles read lock".to_string(),
            })?;

        Ok(profiles.get(entity_id).cloned())
    }

    async fn store_profile(&self, profile: EntityProfile) -> Result<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire profiles write lock".to_string(),
            })?;

        profiles.insert(profile.entity_id.clone(), profile);
        Ok(())
    }

    async fn store_profiles(&self, updates: Vec<EntityProfile>) -> Result<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire profiles write lock".to_string(),
            })?;

        // Single write lock: the whole batch lands or none of it does
        for profile in updates {
            profiles.insert(profile.entity_id.clone(), profile);
        }

        Ok(())
    }

    async fn remove_profile(&self, entity_id: &EntityId) -> Result<bool> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire profiles write lock".to_string(),
            })?;

        Ok(profiles.remove(entity_id).is_some())
    }

    async fn top_profiles(&self, limit: usize) -> Result<Vec<EntityProfile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire profiles read lock".to_string(),
            })?;

        let mut entries: Vec<EntityProfile> = profiles.values().cloned().collect();
        entries.sort_by(|a, b| b.rating.cmp(&a.rating));
        entries.truncate(limit);

        Ok(entries)
    }

    async fn profile_count(&self) -> Result<usize> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| WarRoomError::InternalError {
                message: "Failed to acquire profiles read lock".to_string(),
            })?;

        Ok(profiles.len())
    }
}

/// Recording rating store for tests
///
/// Wraps an in-memory map, records every store call, and can be armed to
/// fail the next batch write to exercise rollback paths.
#[derive(Debug, Default)]
pub struct RecordingRatingStore {
    inner: InMemoryRatingStore,
    store_calls: RwLock<Vec<Vec<EntityProfile>>>,
    fail_next_store: AtomicBool,
}

impl RecordingRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batch store calls made, in order
    pub fn store_calls(&self) -> Vec<Vec<EntityProfile>> {
        self.store_calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Arm the store to fail its next batch write
    pub fn fail_next_store(&self) {
        self.fail_next_store.store(true, Ordering::SeqCst);
    }

    /// Preload profiles without recording calls
    pub async fn preset_profiles(&self, profiles: Vec<EntityProfile>) -> Result<()> {
        self.inner.store_profiles(profiles).await
    }
}

#[async_trait]
impl RatingStore for RecordingRatingStore {
    async fn get_profile(&self, entity_id: &EntityId) -> Result<Option<EntityProfile>> {
        self.inner.get_profile(entity_id).await
    }

    async fn store_profile(&self, profile: EntityProfile) -> Result<()> {
        if let Ok(mut calls) = self.store_calls.write() {
            calls.push(vec![profile.clone()]);
        }
        self.inner.store_profile(profile).await
    }

    async fn store_profiles(&self, updates: Vec<EntityProfile>) -> Result<()> {
        if self.fail_next_store.swap(false, Ordering::SeqCst) {
            return Err(WarRoomError::InternalError {
                message: "injected store failure".to_string(),
            }
            .into());
        }

        if let Ok(mut calls) = self.store_calls.write() {
            calls.push(updates.clone());
        }
        self.inner.store_profiles(updates).await
    }

    async fn remove_profile(&self, entity_id: &EntityId) -> Result<bool> {
        self.inner.remove_profile(entity_id).await
    }

    async fn top_profiles(&self, limit: usize) -> Result<Vec<EntityProfile>> {
        self.inner.top_profiles(limit).await
    }

    async fn profile_count(&self) -> Result<usize> {
        self.inner.profile_count().await
    }
}
