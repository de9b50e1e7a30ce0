//! Main entry point for the War Room service
//!
//! This is the production entry point that initializes and runs the
//! rating/cooldown core service with proper error handling, logging, and
//! graceful shutdown.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use war_room::config::AppConfig;
use war_room::service::{serve_health, AppState, HealthCheck, HealthStatus};

/// War Room - guild war and wager rating service
#[derive(Parser)]
#[command(
    name = "war-room",
    version,
    about = "Rating and transition-cooldown service for guild war management",
    long_about = "War Room hosts the competitive-rating core of a guild-management system: \
                 trust-damped wager ratings, war win/loss bookkeeping, dodge penalties, the \
                 guild-transition cooldown gate, and the match lifecycle state machine."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Perform health check and exit
    #[arg(long, help = "Perform a health check and exit with status code")]
    health_check: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Health/metrics port override
    #[arg(long, value_name = "PORT", help = "Override health endpoint port")]
    health_port: Option<u16>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Perform health check and return appropriate exit code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let app_state = Arc::new(AppState::new(config).await?);
    app_state.start().await;

    match HealthCheck::check(app_state.clone()).await {
        Ok(health) => {
            println!("Health Check: {}", health.status);
            println!("  Open Matches: {}", health.stats.open_matches);
            println!("  Total Matches: {}", health.stats.total_matches);
            println!("  Matches Finalized: {}", health.stats.matches_finalized);
            println!("  Cooldown Records: {}", health.stats.cooldown_records);
            println!("  Uptime: {}", health.stats.uptime_info);

            app_state.shutdown().await;

            if health.status == HealthStatus::Healthy {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load configuration from file or environment with CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if args.debug {
        config.service.log_level = "debug".to_string();
    }
    if let Some(port) = args.health_port {
        config.service.health_port = port;
    }

    war_room::config::validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging(&config.service.log_level)?;

    info!("war-room v{} starting", war_room::VERSION);

    if args.dry_run {
        println!("Configuration valid:");
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if args.health_check {
        return perform_health_check(config).await;
    }

    let app_state = Arc::new(AppState::new(config.clone()).await?);
    app_state.start().await;

    // Health and metrics endpoints run alongside the core
    let health_state = app_state.clone();
    let health_port = config.service.health_port;
    let health_task = tokio::spawn(async move {
        if let Err(e) = serve_health(health_state, health_port).await {
            error!("Health server terminated: {}", e);
        }
    });

    info!("war-room running; press ctrl-c to stop");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
    }

    let shutdown = async {
        health_task.abort();
        app_state.shutdown().await;
    };

    match tokio::time::timeout(config.shutdown_timeout(), shutdown).await {
        Ok(()) => info!("Graceful shutdown complete"),
        Err(_) => warn!(
            "Shutdown timed out after {}s",
            config.service.shutdown_timeout_seconds
        ),
    }

    Ok(())
}
