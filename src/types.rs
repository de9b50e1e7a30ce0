//! Common types used throughout the war-room core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for Discord servers
pub type ServerId = String;

/// Unique identifier for users
pub type UserId = String;

/// Unique identifier for competing entities (guilds or player profiles)
pub type EntityId = String;

/// Unique identifier for matches (wars and wagers)
pub type MatchId = Uuid;

/// Role of a member within a guild
///
/// A single canonical representation; any display-language mapping happens
/// at the presentation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuildRole {
    Leader,
    CoLeader,
    Member,
}

impl std::fmt::Display for GuildRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuildRole::Leader => write!(f, "Leader"),
            GuildRole::CoLeader => write!(f, "CoLeader"),
            GuildRole::Member => write!(f, "Member"),
        }
    }
}

/// A guild roster entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildMember {
    pub user_id: UserId,
    pub role: GuildRole,
}

/// Kind of competitive match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// Guild-vs-guild war: win/loss counters only, no rating delta
    War,
    /// Player wager: trust-scaled rating delta plus counters
    Wager,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::War => write!(f, "War"),
            MatchKind::Wager => write!(f, "Wager"),
        }
    }
}

/// Status of a match record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Match has been requested/scheduled
    Open,
    /// Both sides accepted; decision actions are enabled
    Accepted,
    /// A winner was declared and ratings were applied
    Finalized,
    /// One side dodged and the penalty was applied
    Dodged,
    /// Match was called off before any decision
    Cancelled,
    /// Bookkeeping terminal state, orthogonal to rating status
    Closed,
}

impl MatchStatus {
    /// States from which a decision action (winner/dodge/cancel) may be taken
    pub fn is_decision_source(&self) -> bool {
        matches!(self, MatchStatus::Open | MatchStatus::Accepted)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Open => write!(f, "Open"),
            MatchStatus::Accepted => write!(f, "Accepted"),
            MatchStatus::Finalized => write!(f, "Finalized"),
            MatchStatus::Dodged => write!(f, "Dodged"),
            MatchStatus::Cancelled => write!(f, "Cancelled"),
            MatchStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// Profile of a competing entity (guild or player)
///
/// Rating fields are mutated only through RatingEngine-produced updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub entity_id: EntityId,
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    pub win_streak: u32,
    pub loss_streak: u32,
    pub max_win_streak: u32,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl EntityProfile {
    /// Create a fresh profile at the given initial rating
    pub fn new(entity_id: EntityId, initial_rating: i32, now: DateTime<Utc>) -> Self {
        Self {
            entity_id,
            rating: initial_rating,
            wins: 0,
            losses: 0,
            win_streak: 0,
            loss_streak: 0,
            max_win_streak: 0,
            created_at: now,
            last_updated: now,
        }
    }

    /// Total decided games; feeds the trust multiplier
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }

    /// Advance counters and streaks for a win
    pub fn record_win(&mut self) {
        self.wins += 1;
        self.win_streak += 1;
        self.loss_streak = 0;
        if self.win_streak > self.max_win_streak {
            self.max_win_streak = self.win_streak;
        }
    }

    /// Advance counters and streaks for a loss
    pub fn record_loss(&mut self) {
        self.losses += 1;
        self.loss_streak += 1;
        self.win_streak = 0;
    }

    /// Roll back one previously recorded win
    ///
    /// Streak counters cannot be reconstructed without history; they are
    /// decremented saturating and the max streak high-water mark is kept.
    pub fn revert_win(&mut self) {
        self.wins = self.wins.saturating_sub(1);
        self.win_streak = self.win_streak.saturating_sub(1);
    }

    /// Roll back one previously recorded loss
    pub fn revert_loss(&mut self) {
        self.losses = self.losses.saturating_sub(1);
        self.loss_streak = self.loss_streak.saturating_sub(1);
    }
}

/// A war or wager between two competing entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub kind: MatchKind,
    pub participant_a: EntityId,
    pub participant_b: EntityId,
    pub status: MatchStatus,
    /// Set only when status is Finalized
    pub winner: Option<EntityId>,
    /// Set only when status is Dodged
    pub dodged_by: Option<EntityId>,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Create a new open match
    pub fn new(
        id: MatchId,
        kind: MatchKind,
        participant_a: EntityId,
        participant_b: EntityId,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            participant_a,
            participant_b,
            status: MatchStatus::Open,
            winner: None,
            dodged_by: None,
            scheduled_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the given entity is one of the two participants
    pub fn has_participant(&self, entity_id: &EntityId) -> bool {
        &self.participant_a == entity_id || &self.participant_b == entity_id
    }

    /// The participant opposing the given entity
    pub fn opponent_of(&self, entity_id: &EntityId) -> Option<&EntityId> {
        if &self.participant_a == entity_id {
            Some(&self.participant_b)
        } else if &self.participant_b == entity_id {
            Some(&self.participant_a)
        } else {
            None
        }
    }
}

/// Snapshot of rating values prior to a result, supplied by admin revert
/// commands (no history is stored automatically)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub rating: i32,
}

/// Action requested against a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchAction {
    /// Open → Accepted; enables decision actions
    Accept,
    /// Open/Accepted → Finalized; applies the win/loss result
    DeclareWinner(EntityId),
    /// Open/Accepted → Dodged; applies the dodge penalty
    MarkDodge(EntityId),
    /// Open/Accepted → Cancelled; no rating effect
    Cancel,
    /// Finalized/Dodged/Cancelled → Closed; no rating effect
    Close,
    /// Finalized → Open; restores the supplied prior ratings
    Revert {
        winner_before: RatingSnapshot,
        loser_before: RatingSnapshot,
    },
    /// Dodged → Open; applies the inverse penalty
    UndoDodge,
}

impl MatchAction {
    /// Short action name for logs and metrics labels
    pub fn name(&self) -> &'static str {
        match self {
            MatchAction::Accept => "accept",
            MatchAction::DeclareWinner(_) => "declare_winner",
            MatchAction::MarkDodge(_) => "mark_dodge",
            MatchAction::Cancel => "cancel",
            MatchAction::Close => "close",
            MatchAction::Revert { .. } => "revert",
            MatchAction::UndoDodge => "undo_dodge",
        }
    }
}

/// Cooldown bookkeeping for one (server, user) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownRecord {
    pub server_id: ServerId,
    pub user_id: UserId,
    /// Entity the user last left; absent when the record was created by a
    /// manual override alone
    pub last_left_entity: Option<EntityId>,
    pub left_at: Option<DateTime<Utc>>,
    /// Manual override expiry; takes precedence over the computed window
    /// while in the future
    pub override_until: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Answer to a cooldown status query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownStatus {
    pub active: bool,
    pub remaining_ms: i64,
    pub last_left_entity: Option<EntityId>,
}

impl CooldownStatus {
    /// Status for a user with no cooldown record
    pub fn inactive() -> Self {
        Self {
            active: false,
            remaining_ms: 0,
            last_left_entity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_profile_streak_bookkeeping() {
        let now = Utc::now();
        let mut profile = EntityProfile::new("guild-1".to_string(), 1000, now);

        profile.record_win();
        profile.record_win();
        assert_eq!(profile.wins, 2);
        assert_eq!(profile.win_streak, 2);
        assert_eq!(profile.max_win_streak, 2);

        profile.record_loss();
        assert_eq!(profile.losses, 1);
        assert_eq!(profile.win_streak, 0);
        assert_eq!(profile.loss_streak, 1);
        // High-water mark survives the loss
        assert_eq!(profile.max_win_streak, 2);
        assert_eq!(profile.games_played(), 3);
    }

    #[test]
    fn test_profile_revert_saturates() {
        let now = Utc::now();
        let mut profile = EntityProfile::new("guild-1".to_string(), 1000, now);

        profile.revert_win();
        profile.revert_loss();
        assert_eq!(profile.wins, 0);
        assert_eq!(profile.losses, 0);
        assert_eq!(profile.win_streak, 0);
        assert_eq!(profile.loss_streak, 0);
    }

    #[test]
    fn test_match_record_participants() {
        let now = Utc::now();
        let record = MatchRecord::new(
            Uuid::new_v4(),
            MatchKind::War,
            "guild-a".to_string(),
            "guild-b".to_string(),
            now,
            now,
        );

        assert!(record.has_participant(&"guild-a".to_string()));
        assert!(record.has_participant(&"guild-b".to_string()));
        assert!(!record.has_participant(&"guild-c".to_string()));

        assert_eq!(
            record.opponent_of(&"guild-a".to_string()),
            Some(&"guild-b".to_string())
        );
        assert_eq!(record.opponent_of(&"guild-c".to_string()), None);
    }

    #[test]
    fn test_decision_source_states() {
        assert!(MatchStatus::Open.is_decision_source());
        assert!(MatchStatus::Accepted.is_decision_source());
        assert!(!MatchStatus::Finalized.is_decision_source());
        assert!(!MatchStatus::Dodged.is_decision_source());
        assert!(!MatchStatus::Cancelled.is_decision_source());
        assert!(!MatchStatus::Closed.is_decision_source());
    }
}
