//! Transition planning for the match state machine
//!
//! Validates an action against the match's observed status and produces
//! the status change to attempt. Persisting the change is the manager's
//! job; the plan itself has no side effects.

use crate::error::{Result, WarRoomError};
use crate::lifecycle::store::StatusChange;
use crate::types::{MatchAction, MatchRecord, MatchStatus};

/// Source states each action may fire from
pub fn allowed_sources(action: &MatchAction) -> &'static [MatchStatus] {
    match action {
        MatchAction::Accept => &[MatchStatus::Open],
        MatchAction::DeclareWinner(_) | MatchAction::MarkDodge(_) | MatchAction::Cancel => {
            &[MatchStatus::Open, MatchStatus::Accepted]
        }
        MatchAction::Close => &[
            MatchStatus::Finalized,
            MatchStatus::Dodged,
            MatchStatus::Cancelled,
        ],
        MatchAction::Revert { .. } => &[MatchStatus::Finalized],
        MatchAction::UndoDodge => &[MatchStatus::Dodged],
    }
}

/// Validate `action` against the record and build the status change
///
/// Rejects wrong source states with `InvalidState` and decision targets
/// that are not participants with `EntityNotFound`. Double-submissions
/// (e.g. a second click on a decision button) fail here before any write
/// is attempted.
pub fn plan_transition(record: &MatchRecord, action: &MatchAction) -> Result<StatusChange> {
    let sources = allowed_sources(action);
    if !sources.contains(&record.status) {
        return Err(WarRoomError::InvalidState {
            match_id: record.id.to_string(),
            expected: sources
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join("|"),
            actual: record.status.to_string(),
        }
        .into());
    }

    let change = match action {
        MatchAction::Accept => StatusChange {
            status: MatchStatus::Accepted,
            winner: None,
            dodged_by: None,
        },
        MatchAction::DeclareWinner(winner) => {
            if !record.has_participant(winner) {
                return Err(WarRoomError::EntityNotFound {
                    entity_id: winner.clone(),
                }
                .into());
            }
            StatusChange {
                status: MatchStatus::Finalized,
                winner: Some(winner.clone()),
                dodged_by: None,
            }
        }
        MatchAction::MarkDodge(dodger) => {
            if !record.has_participant(dodger) {
                return Err(WarRoomError::EntityNotFound {
                    entity_id: dodger.clone(),
                }
                .into());
            }
            StatusChange {
                status: MatchStatus::Dodged,
                winner: None,
                dodged_by: Some(dodger.clone()),
            }
        }
        MatchAction::Cancel => StatusChange {
            status: MatchStatus::Cancelled,
            winner: None,
            dodged_by: None,
        },
        MatchAction::Close => StatusChange {
            status: MatchStatus::Closed,
            // Closing is bookkeeping only; decision fields stay
            winner: record.winner.clone(),
            dodged_by: record.dodged_by.clone(),
        },
        MatchAction::Revert { .. } => StatusChange {
            status: MatchStatus::Open,
            winner: None,
            dodged_by: None,
        },
        MatchAction::UndoDodge => StatusChange {
            status: MatchStatus::Open,
            winner: None,
            dodged_by: None,
        },
    };

    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchKind, RatingSnapshot};
    use crate::utils::{current_timestamp, generate_match_id};

    fn test_record(status: MatchStatus) -> MatchRecord {
        let now = current_timestamp();
        let mut record = MatchRecord::new(
            generate_match_id(),
            MatchKind::Wager,
            "player-a".to_string(),
            "player-b".to_string(),
            now,
            now,
        );
        record.status = status;
        record
    }

    #[test]
    fn test_accept_only_from_open() {
        let record = test_record(MatchStatus::Open);
        let change = plan_transition(&record, &MatchAction::Accept).unwrap();
        assert_eq!(change.status, MatchStatus::Accepted);

        let record = test_record(MatchStatus::Accepted);
        assert!(plan_transition(&record, &MatchAction::Accept).is_err());
    }

    #[test]
    fn test_declare_winner_from_open_or_accepted() {
        for status in [MatchStatus::Open, MatchStatus::Accepted] {
            let record = test_record(status);
            let change = plan_transition(
                &record,
                &MatchAction::DeclareWinner("player-a".to_string()),
            )
            .unwrap();
            assert_eq!(change.status, MatchStatus::Finalized);
            assert_eq!(change.winner, Some("player-a".to_string()));
            assert_eq!(change.dodged_by, None);
        }

        // Double-submission against an already finalized match
        let record = test_record(MatchStatus::Finalized);
        let err = plan_transition(
            &record,
            &MatchAction::DeclareWinner("player-a".to_string()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid state"));
    }

    #[test]
    fn test_declare_winner_requires_participant() {
        let record = test_record(MatchStatus::Open);
        assert!(plan_transition(
            &record,
            &MatchAction::DeclareWinner("player-z".to_string()),
        )
        .is_err());
    }

    #[test]
    fn test_dodge_sets_dodger_only() {
        let record = test_record(MatchStatus::Accepted);
        let change =
            plan_transition(&record, &MatchAction::MarkDodge("player-b".to_string())).unwrap();
        assert_eq!(change.status, MatchStatus::Dodged);
        assert_eq!(change.winner, None);
        assert_eq!(change.dodged_by, Some("player-b".to_string()));
    }

    #[test]
    fn test_close_preserves_decision_fields() {
        let mut record = test_record(MatchStatus::Finalized);
        record.winner = Some("player-a".to_string());

        let change = plan_transition(&record, &MatchAction::Close).unwrap();
        assert_eq!(change.status, MatchStatus::Closed);
        assert_eq!(change.winner, Some("player-a".to_string()));

        // Open matches cannot be closed
        let record = test_record(MatchStatus::Open);
        assert!(plan_transition(&record, &MatchAction::Close).is_err());
    }

    #[test]
    fn test_revert_only_from_finalized() {
        let revert = MatchAction::Revert {
            winner_before: RatingSnapshot { rating: 1000 },
            loser_before: RatingSnapshot { rating: 1000 },
        };

        let mut record = test_record(MatchStatus::Finalized);
        record.winner = Some("player-a".to_string());
        let change = plan_transition(&record, &revert).unwrap();
        assert_eq!(change.status, MatchStatus::Open);
        assert_eq!(change.winner, None);

        let record = test_record(MatchStatus::Dodged);
        assert!(plan_transition(&record, &revert).is_err());
    }

    #[test]
    fn test_undo_dodge_only_from_dodged() {
        let mut record = test_record(MatchStatus::Dodged);
        record.dodged_by = Some("player-b".to_string());
        let change = plan_transition(&record, &MatchAction::UndoDodge).unwrap();
        assert_eq!(change.status, MatchStatus::Open);
        assert_eq!(change.dodged_by, None);

        let record = test_record(MatchStatus::Open);
        assert!(plan_transition(&record, &MatchAction::UndoDodge).is_err());
    }

    #[test]
    fn test_closed_is_terminal() {
        let record = test_record(MatchStatus::Closed);
        let actions = [
            MatchAction::Accept,
            MatchAction::DeclareWinner("player-a".to_string()),
            MatchAction::MarkDodge("player-a".to_string()),
            MatchAction::Cancel,
            MatchAction::Close,
            MatchAction::UndoDodge,
        ];
        for action in actions {
            assert!(plan_transition(&record, &action).is_err());
        }
    }
}
