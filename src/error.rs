//! Error types for the war-room core
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating and cooldown scenarios
#[derive(Debug, thiserror::Error)]
pub enum WarRoomError {
    #[error("Invalid state for match {match_id}: expected {expected}, found {actual}")]
    InvalidState {
        match_id: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid duration: {reason}")]
    InvalidDuration { reason: String },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("Entity not found: {entity_id}")]
    EntityNotFound { entity_id: String },

    #[error("Match {match_id} was already processed by a concurrent request")]
    ConcurrentModification { match_id: String },

    #[error("Cooldown still active: {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: i64 },

    #[error("Roster violation: {reason}")]
    RosterViolation { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
