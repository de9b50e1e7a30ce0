//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! war-room service, including environment variable loading, optional
//! TOML file loading, and validation.

use crate::config::{CooldownSettings, RatingSettings};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingSettings,
    pub cooldown: CooldownSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for health check and metrics endpoints
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "war-room".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(port) = env::var("HEALTH_PORT") {
            config.service.health_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HEALTH_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Rating settings
        if let Ok(initial) = env::var("RATING_INITIAL") {
            config.rating.initial_rating = initial
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_INITIAL value: {}", initial))?;
        }
        if let Ok(base_k) = env::var("RATING_BASE_K") {
            config.rating.base_k = base_k
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_BASE_K value: {}", base_k))?;
        }

        // Cooldown settings
        if let Ok(window) = env::var("COOLDOWN_WINDOW_HOURS") {
            config.cooldown.window_hours = window
                .parse()
                .map_err(|_| anyhow!("Invalid COOLDOWN_WINDOW_HOURS value: {}", window))?;
        }
        if let Ok(interval) = env::var("COOLDOWN_SWEEP_INTERVAL_SECONDS") {
            config.cooldown.sweep_interval_seconds = interval.parse().map_err(|_| {
                anyhow!("Invalid COOLDOWN_SWEEP_INTERVAL_SECONDS value: {}", interval)
            })?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply env overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get cooldown sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cooldown.sweep_interval_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports and timeouts
    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    config.rating.validate()?;
    config.cooldown.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.rating.initial_rating, 1000);
        assert_eq!(config.cooldown.window_hours, 72);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.service.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.rating.rating_ceiling, config.rating.rating_ceiling);
        assert_eq!(parsed.service.health_port, config.service.health_port);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[service]\nname = \"custom\"\n").unwrap();
        assert_eq!(parsed.service.name, "custom");
        assert_eq!(parsed.rating.base_k, 32.0);
    }
}
