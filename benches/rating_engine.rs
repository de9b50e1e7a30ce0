//! Performance benchmarks for rating calculations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use war_room::config::RatingSettings;
use war_room::rating::engine::RatingEngine;
use war_room::rating::trust_multiplier;
use war_room::types::EntityProfile;
use war_room::utils::current_timestamp;

fn create_profile(id: &str, rating: i32, wins: u32, losses: u32) -> EntityProfile {
    let mut profile = EntityProfile::new(id.to_string(), rating, current_timestamp());
    profile.wins = wins;
    profile.losses = losses;
    profile
}

fn bench_wager_result(c: &mut Criterion) {
    let engine = RatingEngine::new(RatingSettings::default()).unwrap();
    let winner = create_profile("winner", 1450, 20, 10);
    let loser = create_profile("loser", 1280, 5, 12);
    let now = current_timestamp();

    c.bench_function("apply_wager_result", |b| {
        b.iter(|| {
            engine
                .apply_wager_result(black_box(&winner), black_box(&loser), now)
                .unwrap()
        })
    });
}

fn bench_dodge_penalty(c: &mut Criterion) {
    let engine = RatingEngine::new(RatingSettings::default()).unwrap();
    let dodger = create_profile("dodger", 1000, 3, 3);
    let opponent = create_profile("opponent", 1100, 4, 2);
    let now = current_timestamp();

    c.bench_function("apply_dodge_penalty", |b| {
        b.iter(|| {
            engine
                .apply_dodge_penalty(black_box(&dodger), black_box(&opponent), now)
                .unwrap()
        })
    });
}

fn bench_trust_multiplier(c: &mut Criterion) {
    c.bench_function("trust_multiplier", |b| {
        b.iter(|| {
            for games in 0u32..16 {
                black_box(trust_multiplier(black_box(games)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_wager_result,
    bench_dodge_penalty,
    bench_trust_multiplier
);
criterion_main!(benches);
