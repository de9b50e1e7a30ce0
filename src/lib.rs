//! War Room - Rating and transition-cooldown core for guild management
//!
//! This crate provides the competitive-rating subsystem for guild wars and
//! player wagers (trust-damped Elo deltas, dodge penalties, admin reverts),
//! the guild-transition cooldown gate, and the match lifecycle state
//! machine that ties them together over conditional persistence.

pub mod config;
pub mod cooldown;
pub mod error;
pub mod lifecycle;
pub mod membership;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, WarRoomError};
pub use types::*;

// Re-export key components
pub use cooldown::{CooldownGate, CooldownStore};
pub use lifecycle::{MatchLifecycle, MatchStore};
pub use rating::{RatingEngine, RatingStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
