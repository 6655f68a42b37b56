//! Main entry point for the Ready Room matchmaking service
//!
//! Production entry point that initializes and runs the matchmaking service
//! with proper error handling, logging, and graceful shutdown.

use anyhow::Result;
use clap::Parser;
use ready_room::config::AppConfig;
use ready_room::service::{AppState, HealthReport, HealthStatus};
use std::path::PathBuf;
use tokio::signal;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// Ready Room Matchmaking Service - skill-balanced teams and map voting
#[derive(Parser)]
#[command(
    name = "ready-room",
    version,
    about = "A matchmaking service with skill-balanced teams and map voting",
    long_about = "Ready Room matches queued players into fixed-size games, splits each \
                 batch into two elo-balanced teams, and runs a per-match map vote. The \
                 network transport attaches through the notifier seam; this binary also \
                 serves the read-only query endpoints."
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

    /// Query port override
    #[arg(long, value_name = "PORT", help = "Override query server port")]
    query_port: Option<u16>,

    /// Batch size override
    #[arg(long, value_name = "N", help = "Override players per match")]
    batch_size: Option<usize>,

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
fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let app_state = AppState::new(config.clone())?;
    let report = HealthReport::check(&app_state.engine(), &config.service.name);

    println!("Health Check: {}", report.status);
    println!("  Players Waiting: {}", report.stats.players_waiting);
    println!("  Active Matches: {}", report.stats.active_matches);
    println!("  Matches Created: {}", report.stats.matches_created);
    println!("  Votes Recorded: {}", report.stats.votes_recorded);

    if report.status == HealthStatus::Unhealthy {
        std::process::exit(1);
    }
    std::process::exit(0);
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Ready Room Matchmaking Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Query port: {}", config.service.query_port);
    info!("   Batch size: {}", config.matchmaking.batch_size);
    info!(
        "   Maps: {}",
        config.matchmaking.available_maps.join(", ")
    );
    info!("   Default elo: {}", config.matchmaking.default_elo);
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(query_port) = args.query_port {
        config.service.query_port = query_port;
    }

    if let Some(batch_size) = args.batch_size {
        config.matchmaking.batch_size = batch_size;
    }

    // Overrides can invalidate a previously valid config
    ready_room::config::validate_config(&config)?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // Handle special modes
    if args.health_check {
        return perform_health_check(config);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    // Initialize application state
    info!("Initializing service components...");
    let mut app_state = match AppState::new(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    // Start the service
    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    info!("Ready Room Matchmaking Service is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    // Wait for shutdown signal
    wait_for_shutdown_signal().await;

    // Begin graceful shutdown
    info!("Shutdown signal received, beginning graceful shutdown...");

    let shutdown_timeout = config.shutdown_timeout();
    let shutdown_future = async {
        if let Err(e) = app_state.stop().await {
            warn!("Error while stopping service: {}", e);
        }
        // Give background tasks time to unwind
        sleep(Duration::from_millis(100)).await;
    };

    match tokio::time::timeout(shutdown_timeout, shutdown_future).await {
        Ok(()) => {
            info!("Graceful shutdown completed successfully");
        }
        Err(_) => {
            warn!("Shutdown timeout exceeded, forcing exit");
        }
    }

    info!("Ready Room Matchmaking Service stopped");
    Ok(())
}
