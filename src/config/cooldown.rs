//! Cooldown gate configuration

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Settings for the guild-transition cooldown gate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownSettings {
    /// Base cooldown window after leaving a guild, in hours
    pub window_hours: u32,
    /// Interval between expired-record sweeps, in seconds
    pub sweep_interval_seconds: u64,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            window_hours: 72,
            sweep_interval_seconds: 3600,
        }
    }
}

impl CooldownSettings {
    /// Validate setting values
    pub fn validate(&self) -> Result<()> {
        if self.window_hours == 0 {
            return Err(anyhow!("Cooldown window must be greater than 0"));
        }
        if self.sweep_interval_seconds == 0 {
            return Err(anyhow!("Sweep interval must be greater than 0"));
        }
        Ok(())
    }
}
