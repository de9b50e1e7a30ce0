//! Match lifecycle orchestration
//!
//! This module provides the MatchLifecycle entry point that validates
//! transitions, invokes the rating engine at the right edges, and persists
//! match status and entity profiles.
//!
//! Status advancement goes through the store's compare-and-swap, so a
//! duplicate decision (two admins clicking "declare winner" at once) is
//! applied exactly once; the loser of the race observes a
//! `ConcurrentModification` error.

use crate::error::{Result, WarRoomError};
use crate::lifecycle::store::{MatchStore, StatusChange};
use crate::lifecycle::transitions::plan_transition;
use crate::metrics::MetricsCollector;
use crate::rating::engine::RatingEngine;
use crate::rating::store::RatingStore;
use crate::types::{
    EntityId, EntityProfile, MatchAction, MatchId, MatchKind, MatchRecord, MatchStatus,
};
use crate::utils::{generate_match_id, Clock};
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Statistics about lifecycle operations
#[derive(Debug, Clone, Default)]
pub struct LifecycleStats {
    /// Total matches created
    pub matches_created: u64,
    /// Total matches finalized with a winner
    pub matches_finalized: u64,
    /// Total dodges recorded
    pub dodges_recorded: u64,
    /// Total admin reverts (result reverts and dodge undos)
    pub reverts_applied: u64,
    /// Total transitions rejected (invalid state, lost races, bad input)
    pub transitions_rejected: u64,
}

/// The match lifecycle manager
#[derive(Clone)]
pub struct MatchLifecycle {
    /// Match record store with conditional status updates
    matches: Arc<dyn MatchStore>,
    /// Entity profile store
    profiles: Arc<dyn RatingStore>,
    /// Pure rating computations
    engine: RatingEngine,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Lifecycle statistics
    stats: Arc<RwLock<LifecycleStats>>,
    /// Metrics collector
    metrics: Arc<MetricsCollector>,
}

impl MatchLifecycle {
    /// Create a new lifecycle manager
    pub fn new(
        matches: Arc<dyn MatchStore>,
        profiles: Arc<dyn RatingStore>,
        engine: RatingEngine,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(matches, profiles, engine, clock, metrics)
    }

    /// Create a new lifecycle manager with a metrics collector
    pub fn with_metrics(
        matches: Arc<dyn MatchStore>,
        profiles: Arc<dyn RatingStore>,
        engine: RatingEngine,
        clock: Arc<dyn Clock>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            matches,
            profiles,
            engine,
            clock,
            stats: Arc::new(RwLock::new(LifecycleStats::default())),
            metrics,
        }
    }

    /// Create and persist a new open match
    pub async fn create_match(
        &self,
        kind: MatchKind,
        participant_a: EntityId,
        participant_b: EntityId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<MatchRecord> {
        if participant_a == participant_b {
            return Err(WarRoomError::InternalError {
                message: format!(
                    "a match requires two distinct participants, got '{}' twice",
                    participant_a
                ),
            }
            .into());
        }

        let now = self.clock.now();
        let record = MatchRecord::new(
            generate_match_id(),
            kind,
            participant_a,
            participant_b,
            scheduled_at,
            now,
        );

        self.matches.insert_match(record.clone()).await?;
        self.metrics.record_match_created(&kind.to_string());

        {
            let mut stats = self.write_stats()?;
            stats.matches_created += 1;
        }

        info!(
            "Created {} match {} - {} vs {}",
            record.kind, record.id, record.participant_a, record.participant_b
        );
        Ok(record)
    }

    /// Get a match by ID
    pub async fn get_match(&self, match_id: MatchId) -> Result<Option<MatchRecord>> {
        self.matches.get_match(match_id).await
    }

    /// Apply an action to a match on behalf of `actor`
    ///
    /// Validates the action against the observed status, computes rating
    /// updates, claims the transition via compare-and-swap, then persists
    /// the profile batch. A failed profile write rolls the claim back so
    /// status and ratings advance together or not at all. The actor is
    /// recorded in the audit log only; authorization happens at the
    /// command boundary.
    pub async fn transition(
        &self,
        match_id: MatchId,
        action: MatchAction,
        actor: &str,
    ) -> Result<MatchRecord> {
        let start = Instant::now();

        let result = self.apply_transition(match_id, &action).await;

        match &result {
            Ok(record) => {
                self.metrics.record_transition(
                    &record.kind.to_string(),
                    action.name(),
                    start.elapsed(),
                );
                info!(
                    "Transition {} on match {} by {} -> {}",
                    action.name(),
                    match_id,
                    actor,
                    record.status
                );
            }
            Err(e) => {
                self.metrics
                    .record_transition_failure(action.name(), failure_reason(e));
                if let Ok(mut stats) = self.write_stats() {
                    stats.transitions_rejected += 1;
                }
                info!(
                    "Transition {} on match {} by {} rejected: {}",
                    action.name(),
                    match_id,
                    actor,
                    e
                );
            }
        }

        result
    }

    /// Get a snapshot of lifecycle statistics
    pub fn get_stats(&self) -> Result<LifecycleStats> {
        Ok(self.read_stats()?.clone())
    }

    async fn apply_transition(
        &self,
        match_id: MatchId,
        action: &MatchAction,
    ) -> Result<MatchRecord> {
        let record = self
            .matches
            .get_match(match_id)
            .await?
            .ok_or_else(|| WarRoomError::MatchNotFound {
                match_id: match_id.to_string(),
            })?;

        let change = plan_transition(&record, action)?;
        let profile_updates = self.compute_profile_updates(&record, action).await?;

        // Claim the transition; a concurrent duplicate loses here before
        // any rating is touched
        let updated = self
            .matches
            .update_status(match_id, record.status, change, self.clock.now())
            .await?;

        if !profile_updates.is_empty() {
            if let Err(e) = self.profiles.store_profiles(profile_updates).await {
                self.rollback_claim(&record, &updated).await;
                return Err(e);
            }
        }

        {
            let mut stats = self.write_stats()?;
            match updated.status {
                MatchStatus::Finalized => stats.matches_finalized += 1,
                MatchStatus::Dodged => stats.dodges_recorded += 1,
                MatchStatus::Open => stats.reverts_applied += 1,
                _ => {}
            }
        }

        Ok(updated)
    }

    /// Compute the profile batch a validated action requires
    async fn compute_profile_updates(
        &self,
        record: &MatchRecord,
        action: &MatchAction,
    ) -> Result<Vec<EntityProfile>> {
        let now = self.clock.now();

        match action {
            MatchAction::Accept | MatchAction::Cancel | MatchAction::Close => Ok(vec![]),

            MatchAction::DeclareWinner(winner_id) => {
                let loser_id = self.opponent_of(record, winner_id)?;
                let winner = self.get_or_create_profile(winner_id).await?;
                let loser = self.get_or_create_profile(&loser_id).await?;

                let outcome = match record.kind {
                    MatchKind::War => self.engine.apply_war_result(&winner, &loser, now)?,
                    MatchKind::Wager => self.engine.apply_wager_result(&winner, &loser, now)?,
                };
                Ok(vec![outcome.winner, outcome.loser])
            }

            MatchAction::MarkDodge(dodger_id) => {
                let opponent_id = self.opponent_of(record, dodger_id)?;
                let dodger = self.get_or_create_profile(dodger_id).await?;
                let opponent = self.get_or_create_profile(&opponent_id).await?;

                let outcome = self.engine.apply_dodge_penalty(&dodger, &opponent, now)?;
                Ok(vec![outcome.dodger, outcome.opponent])
            }

            MatchAction::Revert {
                winner_before,
                loser_before,
            } => {
                let winner_id = record.winner.clone().ok_or_else(|| {
                    WarRoomError::InternalError {
                        message: format!("finalized match {} has no winner", record.id),
                    }
                })?;
                let loser_id = self.opponent_of(record, &winner_id)?;
                let winner = self.require_profile(&winner_id).await?;
                let loser = self.require_profile(&loser_id).await?;

                let outcome = self.engine.revert_result(
                    &winner,
                    &loser,
                    *winner_before,
                    *loser_before,
                    now,
                )?;
                Ok(vec![outcome.winner, outcome.loser])
            }

            MatchAction::UndoDodge => {
                let dodger_id = record.dodged_by.clone().ok_or_else(|| {
                    WarRoomError::InternalError {
                        message: format!("dodged match {} has no dodger", record.id),
                    }
                })?;
                let opponent_id = self.opponent_of(record, &dodger_id)?;
                let dodger = self.require_profile(&dodger_id).await?;
                let opponent = self.require_profile(&opponent_id).await?;

                let outcome = self.engine.revert_dodge(&dodger, &opponent, now)?;
                Ok(vec![outcome.dodger, outcome.opponent])
            }
        }
    }

    /// Best-effort rollback of a claimed transition after a profile write
    /// failure
    async fn rollback_claim(&self, original: &MatchRecord, claimed: &MatchRecord) {
        let rollback = StatusChange {
            status: original.status,
            winner: original.winner.clone(),
            dodged_by: original.dodged_by.clone(),
        };

        if let Err(e) = self
            .matches
            .update_status(original.id, claimed.status, rollback, self.clock.now())
            .await
        {
            error!(
                "Failed to roll back match {} to {} after profile write failure: {}",
                original.id, original.status, e
            );
        }
    }

    fn opponent_of(&self, record: &MatchRecord, entity_id: &EntityId) -> Result<EntityId> {
        record
            .opponent_of(entity_id)
            .cloned()
            .ok_or_else(|| {
                WarRoomError::EntityNotFound {
                    entity_id: entity_id.clone(),
                }
                .into()
            })
    }

    async fn get_or_create_profile(&self, entity_id: &EntityId) -> Result<EntityProfile> {
        match self.profiles.get_profile(entity_id).await? {
            Some(profile) => Ok(profile),
            None => Ok(EntityProfile::new(
                entity_id.clone(),
                self.engine.initial_rating(),
                self.clock.now(),
            )),
        }
    }

    async fn require_profile(&self, entity_id: &EntityId) -> Result<EntityProfile> {
        self.profiles
            .get_profile(entity_id)
            .await?
            .ok_or_else(|| {
                WarRoomError::EntityNotFound {
                    entity_id: entity_id.clone(),
                }
                .into()
            })
    }

    fn read_stats(&self) -> Result<std::sync::RwLockReadGuard<'_, LifecycleStats>> {
        self.stats.read().map_err(|_| {
            WarRoomError::InternalError {
                message: "Failed to acquire stats read lock".to_string(),
            }
            .into()
        })
    }

    fn write_stats(&self) -> Result<std::sync::RwLockWriteGuard<'_, LifecycleStats>> {
        self.stats.write().map_err(|_| {
            WarRoomError::InternalError {
                message: "Failed to acquire stats write lock".to_string(),
            }
            .into()
        })
    }
}

/// Metrics label for a rejected transition
fn failure_reason(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<WarRoomError>() {
        Some(WarRoomError::InvalidState { .. }) => "invalid_state",
        Some(WarRoomError::MatchNotFound { .. }) => "match_not_found",
        Some(WarRoomError::EntityNotFound { .. }) => "entity_not_found",
        Some(WarRoomError::ConcurrentModification { .. }) => "concurrent_modification",
        Some(_) => "other",
        None => "internal",
    }
}
