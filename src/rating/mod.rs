//! Rating subsystem: war/wager deltas, dodge penalties, trust damping
//!
//! Wars move win/loss counters only; wagers move integer ratings by a
//! trust-scaled Elo delta; dodges apply a flat penalty.

pub mod engine;
pub mod store;
pub mod trust;

// Re-export commonly used types
pub use engine::{DodgeOutcome, MatchOutcome, RatingDelta, RatingEngine};
pub use store::{InMemoryRatingStore, RatingStore};
pub use trust::trust_multiplier;
