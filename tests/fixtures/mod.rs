//! Shared fixtures for integration tests

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use war_room::config::{CooldownSettings, RatingSettings};
use war_room::cooldown::{CooldownGate, InMemoryCooldownStore};
use war_room::lifecycle::{InMemoryMatchStore, MatchLifecycle};
use war_room::rating::engine::RatingEngine;
use war_room::rating::store::InMemoryRatingStore;
use war_room::types::EntityProfile;
use war_room::utils::FixedClock;

/// A complete test system over in-memory stores and a fixed clock
pub struct TestSystem {
    pub lifecycle: MatchLifecycle,
    pub profiles: Arc<InMemoryRatingStore>,
    pub matches: Arc<InMemoryMatchStore>,
    pub cooldown_gate: Arc<CooldownGate>,
    pub cooldown_store: Arc<InMemoryCooldownStore>,
    pub clock: Arc<FixedClock>,
}

/// Build a test system pinned to a deterministic start time
pub fn create_test_system() -> TestSystem {
    let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(t0));

    let profiles = Arc::new(InMemoryRatingStore::new());
    let matches = Arc::new(InMemoryMatchStore::new());
    let cooldown_store = Arc::new(InMemoryCooldownStore::new());

    let lifecycle = MatchLifecycle::new(
        matches.clone(),
        profiles.clone(),
        RatingEngine::new(RatingSettings::default()).expect("valid default settings"),
        clock.clone(),
    );
    let cooldown_gate = Arc::new(CooldownGate::new(
        cooldown_store.clone(),
        clock.clone(),
        &CooldownSettings::default(),
    ));

    TestSystem {
        lifecycle,
        profiles,
        matches,
        cooldown_gate,
        cooldown_store,
        clock,
    }
}

/// Build a profile with a given rating and game history
pub fn profile_with_games(
    entity_id: &str,
    rating: i32,
    wins: u32,
    losses: u32,
) -> EntityProfile {
    let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let mut profile = EntityProfile::new(entity_id.to_string(), rating, t0);
    profile.wins = wins;
    profile.losses = losses;
    profile
}
