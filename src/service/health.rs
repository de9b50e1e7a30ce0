//! Health check and metrics endpoints
//!
//! This module provides health check functionality for the war-room
//! service, including readiness and liveness probes and the Prometheus
//! metrics endpoint.

use crate::service::app::AppState;
use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Matches currently awaiting a decision
    pub open_matches: usize,
    /// Total matches on record
    pub total_matches: usize,
    /// Matches finalized since service start
    pub matches_finalized: u64,
    /// Dodges recorded since service start
    pub dodges_recorded: u64,
    /// Cooldown records currently held
    pub cooldown_records: usize,
    /// Service uptime information
    pub uptime_info: String,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        let service_check = Self::check_service_running(&app_state).await;
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        let lifecycle_check = Self::check_lifecycle(&app_state).await;
        if lifecycle_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        } else if lifecycle_check.status == HealthStatus::Degraded
            && overall_status == HealthStatus::Healthy
        {
            overall_status = HealthStatus::Degraded;
        }
        checks.push(lifecycle_check);

        let store_check = Self::check_stores(&app_state).await;
        if store_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        } else if store_check.status == HealthStatus::Degraded
            && overall_status == HealthStatus::Healthy
        {
            overall_status = HealthStatus::Degraded;
        }
        checks.push(store_check);

        let stats = Self::gather_service_stats(&app_state).await;

        Ok(HealthCheck {
            status: overall_status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify service can handle requests
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        Ok(Self::check_stores(&app_state).await.status)
    }

    /// Check if service is running
    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Check the lifecycle manager by reading its statistics
    async fn check_lifecycle(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.lifecycle().get_stats() {
            Ok(_stats) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Lifecycle stats check failed: {}", e);
                (
                    HealthStatus::Degraded,
                    Some(format!("Stats check failed: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "match_lifecycle".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Check that the stores answer queries
    async fn check_stores(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let result = async {
            app_state.matches().match_count().await?;
            app_state.profiles().profile_count().await?;
            app_state.cooldowns().record_count().await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;

        let (status, message) = match result {
            Ok(()) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Store check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Store check failed: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "stores".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Gather current service statistics
    async fn gather_service_stats(app_state: &AppState) -> ServiceStats {
        let lifecycle_stats = app_state.lifecycle().get_stats().unwrap_or_default();

        let open_matches = app_state
            .matches()
            .open_match_count()
            .await
            .unwrap_or_else(|e| {
                debug!("Failed to count open matches for health check: {}", e);
                0
            });
        let total_matches = app_state.matches().match_count().await.unwrap_or(0);
        let cooldown_records = app_state.cooldowns().record_count().await.unwrap_or(0);

        ServiceStats {
            open_matches,
            total_matches,
            matches_finalized: lifecycle_stats.matches_finalized,
            dodges_recorded: lifecycle_stats.dodges_recorded,
            cooldown_records,
            uptime_info: format!("up {}s", app_state.uptime_seconds()),
        }
    }

    /// Convert health check to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}

/// Build the health and metrics router
pub fn health_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/health/live", get(get_liveness))
        .route("/health/ready", get(get_readiness))
        .route("/metrics", get(get_metrics))
        .with_state(app_state)
}

/// Serve health and metrics endpoints until the task is aborted
pub async fn serve_health(app_state: Arc<AppState>, port: u16) -> Result<()> {
    let router = health_router(app_state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Health endpoints listening on port {}", port);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match HealthCheck::check(state.clone()).await {
        Ok(health) => {
            let gauge_value = match health.status {
                HealthStatus::Healthy => 2,
                HealthStatus::Degraded => 1,
                HealthStatus::Unhealthy => 0,
            };
            state.metrics().service().health_status.set(gauge_value);

            let code = if health.status == HealthStatus::Unhealthy {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::OK
            };
            (code, Json(health)).into_response()
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn get_liveness(State(state): State<Arc<AppState>>) -> StatusCode {
    match HealthCheck::liveness_check(state).await {
        Ok(HealthStatus::Healthy) => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn get_readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match HealthCheck::readiness_check(state).await {
        Ok(HealthStatus::Healthy) | Ok(HealthStatus::Degraded) => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .metrics()
        .service()
        .uptime_seconds
        .set(state.uptime_seconds());

    let encoder = TextEncoder::new();
    let metric_families = state.metrics().registry().gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => match String::from_utf8(buffer) {
            Ok(body) => (StatusCode::OK, body).into_response(),
            Err(e) => {
                error!("Metrics encoding produced invalid UTF-8: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
            }
        },
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_health_check_before_start_is_unhealthy() {
        let state = Arc::new(AppState::new(AppConfig::default()).await.unwrap());

        let health = HealthCheck::check(state).await.unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert!(health
            .checks
            .iter()
            .any(|c| c.name == "service_running" && c.status == HealthStatus::Unhealthy));
    }

    #[tokio::test]
    async fn test_health_check_after_start_is_healthy() {
        let state = Arc::new(AppState::new(AppConfig::default()).await.unwrap());
        state.start().await;

        let health = HealthCheck::check(state.clone()).await.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.to_json().unwrap().contains("healthy"));

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_liveness_and_readiness_track_running_state() {
        let state = Arc::new(AppState::new(AppConfig::default()).await.unwrap());

        assert_eq!(
            HealthCheck::liveness_check(state.clone()).await.unwrap(),
            HealthStatus::Unhealthy
        );

        state.start().await;
        assert_eq!(
            HealthCheck::liveness_check(state.clone()).await.unwrap(),
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthCheck::readiness_check(state.clone()).await.unwrap(),
            HealthStatus::Healthy
        );

        state.shutdown().await;
    }
}
