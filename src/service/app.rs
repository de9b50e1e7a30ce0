//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the rating
//! engine, cooldown gate, and match lifecycle together (explicit
//! dependency injection, no module-level globals) and owns the background
//! cooldown sweeper.

use crate::config::AppConfig;
use crate::cooldown::{CooldownGate, CooldownStore, InMemoryCooldownStore};
use crate::error::Result;
use crate::lifecycle::{InMemoryMatchStore, MatchLifecycle, MatchStore};
use crate::metrics::MetricsCollector;
use crate::rating::engine::RatingEngine;
use crate::rating::store::{InMemoryRatingStore, RatingStore};
use crate::utils::{Clock, SystemClock};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Match lifecycle orchestrator
    lifecycle: MatchLifecycle,

    /// Guild-transition cooldown gate
    cooldown_gate: Arc<CooldownGate>,

    /// Entity profile store
    profiles: Arc<dyn RatingStore>,

    /// Match record store
    matches: Arc<dyn MatchStore>,

    /// Cooldown record store
    cooldowns: Arc<dyn CooldownStore>,

    /// Metrics collector shared across components
    metrics: Arc<MetricsCollector>,

    /// Time source
    clock: Arc<dyn Clock>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    /// Service start time for uptime reporting
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::with_clock(config, clock).await
    }

    /// Initialize with a specific clock (used by tests)
    pub async fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        info!("Initializing war-room service '{}'", config.service.name);

        let metrics = Arc::new(MetricsCollector::new()?);

        let profiles: Arc<dyn RatingStore> = Arc::new(InMemoryRatingStore::new());
        let matches: Arc<dyn MatchStore> = Arc::new(InMemoryMatchStore::new());
        let cooldowns: Arc<dyn CooldownStore> = Arc::new(InMemoryCooldownStore::new());

        let engine = RatingEngine::new(config.rating.clone())?;
        let lifecycle = MatchLifecycle::with_metrics(
            matches.clone(),
            profiles.clone(),
            engine,
            clock.clone(),
            metrics.clone(),
        );
        let cooldown_gate = Arc::new(CooldownGate::new(
            cooldowns.clone(),
            clock.clone(),
            &config.cooldown,
        ));

        let started_at = clock.now();

        Ok(Self {
            config,
            lifecycle,
            cooldown_gate,
            profiles,
            matches,
            cooldowns,
            metrics,
            clock,
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at,
        })
    }

    /// Start background tasks (cooldown sweeper)
    pub async fn start(&self) {
        {
            let mut running = self.is_running.write().await;
            *running = true;
        }

        let sweeper = tokio::spawn(run_cooldown_sweeper(
            self.cooldowns.clone(),
            self.clock.clone(),
            self.metrics.clone(),
            self.config.sweep_interval(),
            ChronoDuration::hours(self.config.cooldown.window_hours as i64),
        ));
        self.background_tasks.lock().await.push(sweeper);

        info!(
            "war-room service started (sweep interval: {}s)",
            self.config.cooldown.sweep_interval_seconds
        );
    }

    /// Stop background tasks and mark the service as stopped
    pub async fn shutdown(&self) {
        {
            let mut running = self.is_running.write().await;
            *running = false;
        }

        let mut tasks = self.background_tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }

        info!("war-room service shut down");
    }

    /// Whether the service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Match lifecycle entry point
    pub fn lifecycle(&self) -> &MatchLifecycle {
        &self.lifecycle
    }

    /// Cooldown gate entry point
    pub fn cooldown_gate(&self) -> Arc<CooldownGate> {
        self.cooldown_gate.clone()
    }

    /// Entity profile store
    pub fn profiles(&self) -> Arc<dyn RatingStore> {
        self.profiles.clone()
    }

    /// Match record store
    pub fn matches(&self) -> Arc<dyn MatchStore> {
        self.matches.clone()
    }

    /// Cooldown record store
    pub fn cooldowns(&self) -> Arc<dyn CooldownStore> {
        self.cooldowns.clone()
    }

    /// Metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Seconds since the service started
    pub fn uptime_seconds(&self) -> i64 {
        (self.clock.now() - self.started_at).num_seconds()
    }
}

/// Periodically remove cooldown records that are already past their
/// effective expiry
///
/// Safe to run concurrently with gate reads and writes: only rows whose
/// expiry has passed are deleted.
async fn run_cooldown_sweeper(
    cooldowns: Arc<dyn CooldownStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsCollector>,
    sweep_interval: std::time::Duration,
    window: ChronoDuration,
) {
    let mut interval = tokio::time::interval(sweep_interval);
    // First tick fires immediately; skip it so a fresh start does not race
    // service initialization
    interval.tick().await;

    loop {
        interval.tick().await;

        match cooldowns.delete_expired(clock.now(), window).await {
            Ok(removed) => {
                metrics.record_sweep(removed);
                if removed > 0 {
                    debug!("Cooldown sweep removed {} expired records", removed);
                }
            }
            Err(e) => {
                error!("Cooldown sweep failed: {}", e);
            }
        }
    }
}
