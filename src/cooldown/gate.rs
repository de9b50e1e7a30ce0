//! Guild-transition cooldown gate
//!
//! Tracks when a user last left a guild and answers whether a join attempt
//! is blocked. A manual admin override expiry, while in the future, takes
//! precedence over the computed leave window. Rejoining the exact guild
//! the user just left is always allowed.

use crate::config::CooldownSettings;
use crate::cooldown::store::CooldownStore;
use crate::error::{Result, WarRoomError};
use crate::types::{CooldownRecord, CooldownStatus, EntityId, ServerId, UserId};
use crate::utils::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

/// Compute the instant a cooldown record stops being active
///
/// The override expiry wins while it lies in the future; otherwise the
/// record falls back to `left_at + window`. Records with neither source
/// of expiry are inert.
pub fn effective_expiry(
    record: &CooldownRecord,
    window: Duration,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if let Some(override_until) = record.override_until {
        if override_until > now {
            return Some(override_until);
        }
    }
    record.left_at.map(|left_at| left_at + window)
}

/// Gate answering whether guild-join attempts are blocked by a cooldown
pub struct CooldownGate {
    store: Arc<dyn CooldownStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl CooldownGate {
    /// Create a new gate over the given store and clock
    pub fn new(
        store: Arc<dyn CooldownStore>,
        clock: Arc<dyn Clock>,
        config: &CooldownSettings,
    ) -> Self {
        Self {
            store,
            clock,
            window: Duration::hours(config.window_hours as i64),
        }
    }

    /// The configured base cooldown window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record that a user left a guild
    ///
    /// Overwrites the last-left bookkeeping; an existing manual override
    /// is preserved.
    pub async fn record_leave(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
        entity_id: &EntityId,
        when: DateTime<Utc>,
    ) -> Result<()> {
        let existing = self.store.get(server_id, user_id).await?;
        let record = CooldownRecord {
            server_id: server_id.clone(),
            user_id: user_id.clone(),
            last_left_entity: Some(entity_id.clone()),
            left_at: Some(when),
            override_until: existing.and_then(|r| r.override_until),
            updated_at: self.clock.now(),
        };

        debug!(
            "Recording leave - server: {}, user: {}, entity: {}",
            server_id, user_id, entity_id
        );
        self.store.upsert(record).await
    }

    /// Current cooldown status for a user; absence of a record means
    /// not-active, never an error
    pub async fn check_status(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
    ) -> Result<CooldownStatus> {
        let record = match self.store.get(server_id, user_id).await? {
            Some(record) => record,
            None => return Ok(CooldownStatus::inactive()),
        };

        let now = self.clock.now();
        match effective_expiry(&record, self.window, now) {
            Some(expiry) if now < expiry => Ok(CooldownStatus {
                active: true,
                remaining_ms: (expiry - now).num_milliseconds(),
                last_left_entity: record.last_left_entity,
            }),
            _ => Ok(CooldownStatus {
                active: false,
                remaining_ms: 0,
                last_left_entity: record.last_left_entity,
            }),
        }
    }

    /// Whether joining `target_entity` is blocked for this user
    ///
    /// Rejoining the entity the user just left is always allowed,
    /// regardless of cooldown state.
    pub async fn is_join_blocked(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
        target_entity: &EntityId,
    ) -> Result<bool> {
        let status = self.check_status(server_id, user_id).await?;
        if !status.active {
            return Ok(false);
        }

        Ok(status.last_left_entity.as_ref() != Some(target_entity))
    }

    /// Set a manual override expiry, replacing any existing one
    pub async fn set_override(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
        until: DateTime<Utc>,
    ) -> Result<()> {
        let now = self.clock.now();
        if until <= now {
            return Err(WarRoomError::InvalidDuration {
                reason: "override expiry must be in the future".to_string(),
            }
            .into());
        }

        let existing = self.store.get(server_id, user_id).await?;
        let record = self.with_override(server_id, user_id, existing, Some(until));
        self.store.upsert(record).await
    }

    /// Extend the override by `delta`, from the current override or now,
    /// whichever is later
    pub async fn increase_override(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
        delta: Duration,
    ) -> Result<()> {
        check_positive(delta)?;

        let now = self.clock.now();
        let existing = self.store.get(server_id, user_id).await?;
        let base = existing
            .as_ref()
            .and_then(|r| r.override_until)
            .map_or(now, |current| current.max(now));

        let record = self.with_override(server_id, user_id, existing, Some(base + delta));
        self.store.upsert(record).await
    }

    /// Shorten the override by `delta`, clearing it entirely if the result
    /// would already be expired
    pub async fn decrease_override(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
        delta: Duration,
    ) -> Result<()> {
        check_positive(delta)?;

        let existing = match self.store.get(server_id, user_id).await? {
            Some(record) => record,
            None => return Ok(()),
        };
        let current = match existing.override_until {
            Some(current) => current,
            None => return Ok(()),
        };

        let now = self.clock.now();
        let reduced = current - delta;
        let next = if reduced <= now { None } else { Some(reduced) };

        self.apply_override_change(server_id, user_id, existing, next)
            .await
    }

    /// Drop the manual override, falling back to the leave-window rule
    pub async fn clear_override(&self, server_id: &ServerId, user_id: &UserId) -> Result<()> {
        let existing = match self.store.get(server_id, user_id).await? {
            Some(record) => record,
            None => return Ok(()),
        };

        self.apply_override_change(server_id, user_id, existing, None)
            .await
    }

    /// Delete the record entirely, fully resetting cooldown state
    pub async fn clear_all(&self, server_id: &ServerId, user_id: &UserId) -> Result<()> {
        self.store.delete(server_id, user_id).await?;
        Ok(())
    }

    fn with_override(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
        existing: Option<CooldownRecord>,
        override_until: Option<DateTime<Utc>>,
    ) -> CooldownRecord {
        let now = self.clock.now();
        match existing {
            Some(mut record) => {
                record.override_until = override_until;
                record.updated_at = now;
                record
            }
            None => CooldownRecord {
                server_id: server_id.clone(),
                user_id: user_id.clone(),
                last_left_entity: None,
                left_at: None,
                override_until,
                updated_at: now,
            },
        }
    }

    async fn apply_override_change(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
        existing: CooldownRecord,
        override_until: Option<DateTime<Utc>>,
    ) -> Result<()> {
        // A record with no leave data and no override carries nothing
        if override_until.is_none() && existing.left_at.is_none() {
            self.store.delete(server_id, user_id).await?;
            return Ok(());
        }

        let record = self.with_override(server_id, user_id, Some(existing), override_until);
        self.store.upsert(record).await
    }
}

fn check_positive(delta: Duration) -> Result<()> {
    if delta <= Duration::zero() {
        return Err(WarRoomError::InvalidDuration {
            reason: "duration must be positive".to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooldown::store::InMemoryCooldownStore;
    use crate::utils::FixedClock;
    use chrono::TimeZone;

    fn setup() -> (CooldownGate, Arc<FixedClock>, DateTime<Utc>) {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(t0));
        let store = Arc::new(InMemoryCooldownStore::new());
        let gate = CooldownGate::new(store, clock.clone(), &CooldownSettings::default());
        (gate, clock, t0)
    }

    fn ids() -> (ServerId, UserId) {
        ("server-1".to_string(), "user-1".to_string())
    }

    #[tokio::test]
    async fn test_missing_record_is_inactive() {
        let (gate, _clock, _t0) = setup();
        let (server, user) = ids();

        let status = gate.check_status(&server, &user).await.unwrap();
        assert!(!status.active);
        assert_eq!(status.remaining_ms, 0);
        assert!(!gate
            .is_join_blocked(&server, &user, &"guild-x".to_string())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_leave_blocks_other_guilds_but_not_rejoin() {
        let (gate, clock, t0) = setup();
        let (server, user) = ids();

        gate.record_leave(&server, &user, &"guild-1".to_string(), t0)
            .await
            .unwrap();

        // One day later: a different guild is blocked with ~2 days left
        clock.advance(Duration::days(1));
        let status = gate.check_status(&server, &user).await.unwrap();
        assert!(status.active);
        assert_eq!(status.remaining_ms, Duration::days(2).num_milliseconds());

        assert!(gate
            .is_join_blocked(&server, &user, &"guild-2".to_string())
            .await
            .unwrap());
        assert!(!gate
            .is_join_blocked(&server, &user, &"guild-1".to_string())
            .await
            .unwrap());

        // Past the window everything is allowed
        clock.advance(Duration::days(2) + Duration::seconds(1));
        assert!(!gate
            .is_join_blocked(&server, &user, &"guild-2".to_string())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_override_takes_precedence_and_falls_back() {
        let (gate, clock, t0) = setup();
        let (server, user) = ids();

        gate.record_leave(&server, &user, &"guild-1".to_string(), t0)
            .await
            .unwrap();

        // Admin extends well past the base window
        let override_until = t0 + Duration::days(10);
        gate.set_override(&server, &user, override_until)
            .await
            .unwrap();

        clock.advance(Duration::days(5));
        let status = gate.check_status(&server, &user).await.unwrap();
        assert!(status.active);
        assert_eq!(status.remaining_ms, Duration::days(5).num_milliseconds());

        // Clearing the override falls back to leftAt + window, already past
        gate.clear_override(&server, &user).await.unwrap();
        let status = gate.check_status(&server, &user).await.unwrap();
        assert!(!status.active);
    }

    #[tokio::test]
    async fn test_expired_override_falls_back_to_window() {
        let (gate, clock, t0) = setup();
        let (server, user) = ids();

        gate.record_leave(&server, &user, &"guild-1".to_string(), t0)
            .await
            .unwrap();
        gate.set_override(&server, &user, t0 + Duration::hours(1))
            .await
            .unwrap();

        // Override lapsed but the base window still runs
        clock.advance(Duration::hours(2));
        let status = gate.check_status(&server, &user).await.unwrap();
        assert!(status.active);
        assert_eq!(
            status.remaining_ms,
            (Duration::hours(70)).num_milliseconds()
        );
    }

    #[tokio::test]
    async fn test_increase_override_extends_from_later_of_current_and_now() {
        let (gate, clock, t0) = setup();
        let (server, user) = ids();

        // No record yet: extends from now
        gate.increase_override(&server, &user, Duration::days(1))
            .await
            .unwrap();
        let status = gate.check_status(&server, &user).await.unwrap();
        assert!(status.active);
        assert_eq!(status.remaining_ms, Duration::days(1).num_milliseconds());

        // Extends from the current override while it is in the future
        gate.increase_override(&server, &user, Duration::days(1))
            .await
            .unwrap();
        let status = gate.check_status(&server, &user).await.unwrap();
        assert_eq!(status.remaining_ms, Duration::days(2).num_milliseconds());

        // After expiry the base is now again
        clock.set(t0 + Duration::days(30));
        gate.increase_override(&server, &user, Duration::hours(6))
            .await
            .unwrap();
        let status = gate.check_status(&server, &user).await.unwrap();
        assert_eq!(status.remaining_ms, Duration::hours(6).num_milliseconds());
    }

    #[tokio::test]
    async fn test_decrease_override_clears_when_expired() {
        let (gate, _clock, t0) = setup();
        let (server, user) = ids();

        gate.set_override(&server, &user, t0 + Duration::hours(4))
            .await
            .unwrap();

        // Shorten but keep in the future
        gate.decrease_override(&server, &user, Duration::hours(1))
            .await
            .unwrap();
        let status = gate.check_status(&server, &user).await.unwrap();
        assert_eq!(status.remaining_ms, Duration::hours(3).num_milliseconds());

        // Shorten past now: override cleared, record had no leave data, so
        // the user is fully reset
        gate.decrease_override(&server, &user, Duration::days(1))
            .await
            .unwrap();
        let status = gate.check_status(&server, &user).await.unwrap();
        assert!(!status.active);
    }

    #[tokio::test]
    async fn test_pure_override_blocks_every_guild() {
        let (gate, _clock, t0) = setup();
        let (server, user) = ids();

        gate.set_override(&server, &user, t0 + Duration::days(1))
            .await
            .unwrap();

        // No last-left entity: no rejoin exemption applies
        assert!(gate
            .is_join_blocked(&server, &user, &"guild-1".to_string())
            .await
            .unwrap());
        assert!(gate
            .is_join_blocked(&server, &user, &"guild-2".to_string())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_clear_all_resets_everything() {
        let (gate, _clock, t0) = setup();
        let (server, user) = ids();

        gate.record_leave(&server, &user, &"guild-1".to_string(), t0)
            .await
            .unwrap();
        gate.set_override(&server, &user, t0 + Duration::days(10))
            .await
            .unwrap();

        gate.clear_all(&server, &user).await.unwrap();
        let status = gate.check_status(&server, &user).await.unwrap();
        assert!(!status.active);
        assert!(status.last_left_entity.is_none());
    }

    #[tokio::test]
    async fn test_leave_preserves_existing_override() {
        let (gate, _clock, t0) = setup();
        let (server, user) = ids();

        let override_until = t0 + Duration::days(7);
        gate.set_override(&server, &user, override_until)
            .await
            .unwrap();
        gate.record_leave(&server, &user, &"guild-1".to_string(), t0)
            .await
            .unwrap();

        let status = gate.check_status(&server, &user).await.unwrap();
        assert!(status.active);
        assert_eq!(status.remaining_ms, Duration::days(7).num_milliseconds());
        assert_eq!(status.last_left_entity, Some("guild-1".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_durations_rejected() {
        let (gate, _clock, t0) = setup();
        let (server, user) = ids();

        assert!(gate
            .increase_override(&server, &user, Duration::zero())
            .await
            .is_err());
        assert!(gate
            .decrease_override(&server, &user, Duration::seconds(-5))
            .await
            .is_err());
        assert!(gate
            .set_override(&server, &user, t0 - Duration::seconds(1))
            .await
            .is_err());
    }
}
