//! Trust multiplier for wager rating deltas
//!
//! New profiles get damped rating swings until they have enough decided
//! games behind them.

/// Map games played to a damping factor for wager rating deltas
///
/// Monotonically non-decreasing, bounded in (0, 1].
pub fn trust_multiplier(games_played: u32) -> f64 {
    match games_played {
        0..=2 => 0.5,
        3..=4 => 0.6,
        5..=6 => 0.7,
        7..=9 => 0.8,
        _ => 1.0,
    }
}
