//! Guild membership rules
//!
//! Roster validation runs explicitly before every roster write; there is
//! no reliance on persistence-layer hooks. The join gate couples guild
//! joins to the transition cooldown.

use crate::cooldown::CooldownGate;
use crate::error::{Result, WarRoomError};
use crate::types::{EntityId, GuildMember, GuildRole, ServerId, UserId};
use std::sync::Arc;

/// Validate leadership uniqueness for a guild roster
///
/// A guild has at most one Leader and at most one CoLeader at any time.
/// Call this before persisting any roster change.
pub fn validate_roster(members: &[GuildMember]) -> Result<()> {
    let leaders = members
        .iter()
        .filter(|m| m.role == GuildRole::Leader)
        .count();
    if leaders > 1 {
        return Err(WarRoomError::RosterViolation {
            reason: format!("guild has {} leaders, at most one allowed", leaders),
        }
        .into());
    }

    let co_leaders = members
        .iter()
        .filter(|m| m.role == GuildRole::CoLeader)
        .count();
    if co_leaders > 1 {
        return Err(WarRoomError::RosterViolation {
            reason: format!("guild has {} co-leaders, at most one allowed", co_leaders),
        }
        .into());
    }

    Ok(())
}

/// Gate that guild-join flows consult before admitting a user
pub struct JoinGate {
    cooldowns: Arc<CooldownGate>,
}

impl JoinGate {
    pub fn new(cooldowns: Arc<CooldownGate>) -> Self {
        Self { cooldowns }
    }

    /// Check whether the user may join the target guild right now
    ///
    /// Succeeds when no cooldown is active or the user is rejoining the
    /// guild they just left; otherwise reports the remaining time.
    pub async fn attempt_join(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
        target_entity: &EntityId,
    ) -> Result<()> {
        let status = self.cooldowns.check_status(server_id, user_id).await?;
        if status.active && status.last_left_entity.as_ref() != Some(target_entity) {
            return Err(WarRoomError::CooldownActive {
                remaining_secs: status.remaining_ms / 1000,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CooldownSettings;
    use crate::cooldown::InMemoryCooldownStore;
    use crate::utils::{Clock, FixedClock};
    use chrono::Duration;

    fn member(user: &str, role: GuildRole) -> GuildMember {
        GuildMember {
            user_id: user.to_string(),
            role,
        }
    }

    #[test]
    fn test_roster_with_unique_leadership_is_valid() {
        let roster = vec![
            member("u1", GuildRole::Leader),
            member("u2", GuildRole::CoLeader),
            member("u3", GuildRole::Member),
            member("u4", GuildRole::Member),
        ];
        assert!(validate_roster(&roster).is_ok());
    }

    #[test]
    fn test_duplicate_leader_rejected() {
        let roster = vec![
            member("u1", GuildRole::Leader),
            member("u2", GuildRole::Leader),
        ];
        assert!(validate_roster(&roster).is_err());
    }

    #[test]
    fn test_duplicate_co_leader_rejected() {
        let roster = vec![
            member("u1", GuildRole::Leader),
            member("u2", GuildRole::CoLeader),
            member("u3", GuildRole::CoLeader),
        ];
        assert!(validate_roster(&roster).is_err());
    }

    #[test]
    fn test_empty_roster_is_valid() {
        assert!(validate_roster(&[]).is_ok());
    }

    #[tokio::test]
    async fn test_join_gate_reports_remaining_time() {
        let clock = Arc::new(FixedClock::new(crate::utils::current_timestamp()));
        let store = Arc::new(InMemoryCooldownStore::new());
        let gate = Arc::new(CooldownGate::new(
            store,
            clock.clone(),
            &CooldownSettings::default(),
        ));
        let join_gate = JoinGate::new(gate.clone());

        let server = "server-1".to_string();
        let user = "user-1".to_string();

        // Free to join anywhere before any leave
        assert!(join_gate
            .attempt_join(&server, &user, &"guild-2".to_string())
            .await
            .is_ok());

        gate.record_leave(&server, &user, &"guild-1".to_string(), clock.now())
            .await
            .unwrap();

        // Other guilds blocked, rejoin allowed
        let err = join_gate
            .attempt_join(&server, &user, &"guild-2".to_string())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Cooldown still active"));
        assert!(join_gate
            .attempt_join(&server, &user, &"guild-1".to_string())
            .await
            .is_ok());

        // Window expiry frees the user
        clock.advance(Duration::hours(73));
        assert!(join_gate
            .attempt_join(&server, &user, &"guild-2".to_string())
            .await
            .is_ok());
    }
}
