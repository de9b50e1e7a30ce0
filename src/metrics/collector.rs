//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the war-room service:
//! match transitions, rating movement, and cooldown sweeping.

use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the war-room service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Match lifecycle metrics
    match_metrics: MatchMetrics,

    /// Cooldown gate metrics
    cooldown_metrics: CooldownMetrics,

    /// Service-level metrics
    service_metrics: ServiceMetrics,
}

/// Match lifecycle metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Successful transitions by match kind and action
    pub transitions_total: IntCounterVec,

    /// Rejected transitions by action and failure reason
    pub transition_failures_total: IntCounterVec,

    /// Matches created by kind
    pub matches_created_total: IntCounterVec,

    /// Transition processing time
    pub transition_duration_seconds: Histogram,
}

/// Cooldown gate metrics
#[derive(Clone)]
pub struct CooldownMetrics {
    /// Sweeper runs
    pub sweeps_total: IntCounter,

    /// Expired records removed by the sweeper
    pub records_swept_total: IntCounter,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let match_metrics = MatchMetrics::new(&registry)?;
        let cooldown_metrics = CooldownMetrics::new(&registry)?;
        let service_metrics = ServiceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            match_metrics,
            cooldown_metrics,
            service_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get match metrics
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    /// Get cooldown metrics
    pub fn cooldowns(&self) -> &CooldownMetrics {
        &self.cooldown_metrics
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Record a successful match transition
    pub fn record_transition(&self, kind: &str, action: &str, duration: Duration) {
        self.match_metrics
            .transitions_total
            .with_label_values(&[kind, action])
            .inc();
        self.match_metrics
            .transition_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a rejected match transition
    pub fn record_transition_failure(&self, action: &str, reason: &str) {
        self.match_metrics
            .transition_failures_total
            .with_label_values(&[action, reason])
            .inc();
    }

    /// Record a created match
    pub fn record_match_created(&self, kind: &str) {
        self.match_metrics
            .matches_created_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Record a sweeper run and how many records it removed
    pub fn record_sweep(&self, removed: usize) {
        self.cooldown_metrics.sweeps_total.inc();
        self.cooldown_metrics
            .records_swept_total
            .inc_by(removed as u64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        // Registration on a fresh registry cannot collide
        Self::new().expect("Failed to create default metrics collector")
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let transitions_total = IntCounterVec::new(
            Opts::new(
                "warroom_match_transitions_total",
                "Successful match transitions",
            ),
            &["kind", "action"],
        )?;
        registry.register(Box::new(transitions_total.clone()))?;

        let transition_failures_total = IntCounterVec::new(
            Opts::new(
                "warroom_match_transition_failures_total",
                "Rejected match transitions",
            ),
            &["action", "reason"],
        )?;
        registry.register(Box::new(transition_failures_total.clone()))?;

        let matches_created_total = IntCounterVec::new(
            Opts::new("warroom_matches_created_total", "Matches created"),
            &["kind"],
        )?;
        registry.register(Box::new(matches_created_total.clone()))?;

        let transition_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "warroom_transition_duration_seconds",
            "Transition processing time",
        ))?;
        registry.register(Box::new(transition_duration_seconds.clone()))?;

        Ok(Self {
            transitions_total,
            transition_failures_total,
            matches_created_total,
            transition_duration_seconds,
        })
    }
}

impl CooldownMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let sweeps_total = IntCounter::new("warroom_cooldown_sweeps_total", "Sweeper runs")?;
        registry.register(Box::new(sweeps_total.clone()))?;

        let records_swept_total = IntCounter::new(
            "warroom_cooldown_records_swept_total",
            "Expired cooldown records removed",
        )?;
        registry.register(Box::new(records_swept_total.clone()))?;

        Ok(Self {
            sweeps_total,
            records_swept_total,
        })
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("warroom_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "warroom_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_records_without_panic() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_match_created("war");
        collector.record_transition("war", "declare_winner", Duration::from_millis(5));
        collector.record_transition_failure("declare_winner", "invalid_state");
        collector.record_sweep(3);

        let families = collector.registry().gather();
        assert!(!families.is_empty());
    }

    #[test]
    fn test_independent_registries() {
        // Two collectors must not collide on metric names
        let a = MetricsCollector::new().unwrap();
        let b = MetricsCollector::new().unwrap();
        a.record_match_created("war");
        b.record_match_created("wager");

        assert_eq!(
            a.matches()
                .matches_created_total
                .with_label_values(&["war"])
                .get(),
            1
        );
        assert_eq!(
            b.matches()
                .matches_created_total
                .with_label_values(&["war"])
                .get(),
            0
        );
    }
}
