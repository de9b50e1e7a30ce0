//! Rating engine for war, wager, and dodge outcomes
//!
//! All operations are pure: they take current profiles and return updated
//! copies plus the applied deltas. Persistence belongs to the caller.

use crate::config::RatingSettings;
use crate::error::{Result, WarRoomError};
use crate::rating::trust::trust_multiplier;
use crate::types::{EntityProfile, RatingSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::elo::{expected_score, EloRating};

/// Rating delta applied to a wager pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatingDelta {
    /// Points added to the winner and removed from the loser
    pub amount: i32,
    /// Winner's expected score before the match
    pub expected_score: f64,
    /// Trust damping factor applied to the K-factor
    pub trust_factor: f64,
    /// K-factor after trust damping
    pub effective_k: f64,
}

/// Result of applying a win/loss outcome
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub winner: EntityProfile,
    pub loser: EntityProfile,
    /// Present for wagers; wars move counters only
    pub delta: Option<RatingDelta>,
}

/// Result of applying or undoing a dodge penalty
#[derive(Debug, Clone)]
pub struct DodgeOutcome {
    pub dodger: EntityProfile,
    pub opponent: EntityProfile,
}

/// Computes rating adjustments for match outcomes
///
/// Wars are fixed-point bookkeeping (win/loss counters, no rating delta);
/// wagers move ratings by a trust-scaled Elo delta; dodges apply a flat
/// penalty. All persisted ratings are integers clamped to the configured
/// bounds.
#[derive(Debug, Clone)]
pub struct RatingEngine {
    config: RatingSettings,
}

impl RatingEngine {
    /// Create a new rating engine with validated settings
    pub fn new(config: RatingSettings) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configured initial rating for fresh profiles
    pub fn initial_rating(&self) -> i32 {
        self.config.initial_rating
    }

    /// Apply a guild-war result: counters and streaks only
    pub fn apply_war_result(
        &self,
        winner: &EntityProfile,
        loser: &EntityProfile,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome> {
        self.check_distinct(winner, loser)?;

        let mut winner = winner.clone();
        let mut loser = loser.clone();
        winner.record_win();
        loser.record_loss();
        winner.last_updated = now;
        loser.last_updated = now;

        Ok(MatchOutcome {
            winner,
            loser,
            delta: None,
        })
    }

    /// Apply a wager result: trust-scaled Elo delta plus counters
    ///
    /// Expected score uses the standard logistic curve; the K-factor is
    /// damped by the trust multiplier of whichever side has fewer decided
    /// games. Winner and loser move symmetrically.
    pub fn apply_wager_result(
        &self,
        winner: &EntityProfile,
        loser: &EntityProfile,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome> {
        self.check_distinct(winner, loser)?;

        let winner_elo = EloRating {
            rating: winner.rating as f64,
        };
        let loser_elo = EloRating {
            rating: loser.rating as f64,
        };
        let (expected_winner, _expected_loser) = expected_score(&winner_elo, &loser_elo);

        let trust_factor =
            trust_multiplier(winner.games_played().min(loser.games_played()));
        let effective_k = self.config.base_k * trust_factor;
        let amount = (effective_k * (1.0 - expected_winner)).round() as i32;

        let mut winner = winner.clone();
        let mut loser = loser.clone();
        winner.rating = self.clamp(winner.rating as i64 + amount as i64);
        loser.rating = self.clamp(loser.rating as i64 - amount as i64);
        winner.record_win();
        loser.record_loss();
        winner.last_updated = now;
        loser.last_updated = now;

        Ok(MatchOutcome {
            winner,
            loser,
            delta: Some(RatingDelta {
                amount,
                expected_score: expected_winner,
                trust_factor,
                effective_k,
            }),
        })
    }

    /// Apply the flat dodge penalty: dodger loses, opponent gains
    ///
    /// Unconditional; not scaled by trust or rating difference.
    pub fn apply_dodge_penalty(
        &self,
        dodger: &EntityProfile,
        opponent: &EntityProfile,
        now: DateTime<Utc>,
    ) -> Result<DodgeOutcome> {
        self.check_distinct(dodger, opponent)?;

        let mut dodger = dodger.clone();
        let mut opponent = opponent.clone();
        dodger.rating = self.clamp(dodger.rating as i64 - self.config.dodge_penalty as i64);
        opponent.rating = self.clamp(opponent.rating as i64 + self.config.dodge_reward as i64);
        dodger.last_updated = now;
        opponent.last_updated = now;

        Ok(DodgeOutcome { dodger, opponent })
    }

    /// Undo a dodge penalty: inverse adjustment, clamped
    pub fn revert_dodge(
        &self,
        dodger: &EntityProfile,
        opponent: &EntityProfile,
        now: DateTime<Utc>,
    ) -> Result<DodgeOutcome> {
        self.check_distinct(dodger, opponent)?;

        let mut dodger = dodger.clone();
        let mut opponent = opponent.clone();
        dodger.rating = self.clamp(dodger.rating as i64 + self.config.dodge_penalty as i64);
        opponent.rating = self.clamp(opponent.rating as i64 - self.config.dodge_reward as i64);
        dodger.last_updated = now;
        opponent.last_updated = now;

        Ok(DodgeOutcome { dodger, opponent })
    }

    /// Revert a previously applied result
    ///
    /// Restores the exact caller-supplied prior ratings and rolls back the
    /// counters the original result advanced.
    pub fn revert_result(
        &self,
        winner: &EntityProfile,
        loser: &EntityProfile,
        winner_before: RatingSnapshot,
        loser_before: RatingSnapshot,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome> {
        self.check_distinct(winner, loser)?;

        let mut winner = winner.clone();
        let mut loser = loser.clone();
        winner.rating = self.clamp(winner_before.rating as i64);
        loser.rating = self.clamp(loser_before.rating as i64);
        winner.revert_win();
        loser.revert_loss();
        winner.last_updated = now;
        loser.last_updated = now;

        Ok(MatchOutcome {
            winner,
            loser,
            delta: None,
        })
    }

    fn check_distinct(&self, a: &EntityProfile, b: &EntityProfile) -> Result<()> {
        if a.entity_id == b.entity_id {
            return Err(WarRoomError::InternalError {
                message: format!(
                    "rating operation requires two distinct entities, got '{}' twice",
                    a.entity_id
                ),
            }
            .into());
        }
        Ok(())
    }

    fn clamp(&self, rating: i64) -> i32 {
        rating
            .max(self.config.rating_floor as i64)
            .min(self.config.rating_ceiling as i64) as i32
    }
}
