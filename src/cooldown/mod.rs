//! Guild-transition cooldown subsystem
//!
//! Bookkeeping for "last left guild" timestamps, manual admin overrides,
//! and the join-block answer consulted before guild membership changes.

pub mod gate;
pub mod store;

// Re-export commonly used types
pub use gate::{effective_expiry, CooldownGate};
pub use store::{CooldownStore, InMemoryCooldownStore};
