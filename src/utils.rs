//! Utility functions for the war-room core

use crate::error::{Result, WarRoomError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use uuid::Uuid;

/// Generate a new unique match ID
pub fn generate_match_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Clock abstraction so cooldown and lifecycle logic can be tested against
/// a controlled notion of "now"
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        current_timestamp()
    }
}

/// Settable clock for tests
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to an absolute instant
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    /// Move the clock forward
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Parse a human duration string ("3d", "12h", "45m", "90s", or
/// combinations such as "1d12h") into a positive duration
///
/// Rejects empty input, unknown units, and durations that are not
/// strictly positive.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WarRoomError::InvalidDuration {
            reason: "empty duration".to_string(),
        }
        .into());
    }

    let mut total_secs: i64 = 0;
    let mut digits = String::new();

    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        if digits.is_empty() {
            return Err(WarRoomError::InvalidDuration {
                reason: format!("unexpected '{}' in '{}'", ch, input),
            }
            .into());
        }

        let value: i64 = digits
            .parse()
            .map_err(|_| WarRoomError::InvalidDuration {
                reason: format!("invalid number in '{}'", input),
            })?;
        digits.clear();

        let unit_secs = match ch.to_ascii_lowercase() {
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            other => {
                return Err(WarRoomError::InvalidDuration {
                    reason: format!("unknown unit '{}' in '{}'", other, input),
                }
                .into())
            }
        };

        total_secs = total_secs
            .checked_add(value.checked_mul(unit_secs).ok_or_else(|| {
                WarRoomError::InvalidDuration {
                    reason: format!("duration overflow in '{}'", input),
                }
            })?)
            .ok_or_else(|| WarRoomError::InvalidDuration {
                reason: format!("duration overflow in '{}'", input),
            })?;
    }

    if !digits.is_empty() {
        return Err(WarRoomError::InvalidDuration {
            reason: format!("missing unit in '{}'", input),
        }
        .into());
    }

    if total_secs <= 0 {
        return Err(WarRoomError::InvalidDuration {
            reason: "duration must be positive".to_string(),
        }
        .into());
    }

    Ok(Duration::seconds(total_secs))
}
