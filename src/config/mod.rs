//! Configuration management for the war-room service
//!
//! This module handles all configuration loading from environment
//! variables or TOML files, validation, and default values.

pub mod app;
pub mod cooldown;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use cooldown::CooldownSettings;
pub use rating::RatingSettings;
