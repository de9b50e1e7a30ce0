//! Rating system configuration

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Settings for the rating engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    /// Rating assigned to fresh profiles
    pub initial_rating: i32,
    /// Lowest persistable rating
    pub rating_floor: i32,
    /// Highest persistable rating
    pub rating_ceiling: i32,
    /// Base K-factor for wager deltas, damped by the trust multiplier
    pub base_k: f64,
    /// Points removed from a dodger
    pub dodge_penalty: i32,
    /// Points granted to the dodged opponent
    pub dodge_reward: i32,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            initial_rating: 1000,
            rating_floor: 0,
            rating_ceiling: 5000,
            base_k: 32.0,
            dodge_penalty: 16,
            dodge_reward: 8,
        }
    }
}

impl RatingSettings {
    /// Validate setting values
    pub fn validate(&self) -> Result<()> {
        if self.rating_floor >= self.rating_ceiling {
            return Err(anyhow!(
                "Rating floor {} must be below ceiling {}",
                self.rating_floor,
                self.rating_ceiling
            ));
        }
        if self.initial_rating < self.rating_floor || self.initial_rating > self.rating_ceiling {
            return Err(anyhow!(
                "Initial rating {} outside [{}, {}]",
                self.initial_rating,
                self.rating_floor,
                self.rating_ceiling
            ));
        }
        if self.base_k <= 0.0 {
            return Err(anyhow!("Base K-factor must be positive"));
        }
        if self.dodge_penalty < 0 || self.dodge_reward < 0 {
            return Err(anyhow!("Dodge adjustments cannot be negative"));
        }
        Ok(())
    }
}
