//! Main application state and service coordination
//!
//! Wires configuration into the engine, the metrics collector, and the
//! query server, and owns the background task handles for startup and
//! graceful shutdown.

use crate::config::AppConfig;
use crate::engine::MatchmakingEngine;
use crate::metrics::MetricsCollector;
use crate::notify::{LoggingNotifier, Notifier};
use crate::service::query::{QueryServer, QueryServerConfig};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Core matchmaking engine
    engine: Arc<MatchmakingEngine>,

    /// Read-only HTTP query surface
    query_server: Arc<QueryServer>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with the default logging notifier.
    ///
    /// A real transport replaces the notifier via [`AppState::with_notifier`].
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::with_notifier(config, Arc::new(LoggingNotifier::new()))
    }

    /// Initialize the application with a transport-provided notifier
    pub fn with_notifier(config: AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        info!("Initializing ready-room matchmaking service");
        info!(
            "Configuration: service={}, batch_size={}, maps={:?}",
            config.service.name,
            config.matchmaking.batch_size,
            config.matchmaking.available_maps
        );

        let metrics = Arc::new(MetricsCollector::new()?);
        let engine = Arc::new(MatchmakingEngine::with_metrics(
            config.matchmaking.clone(),
            notifier,
            metrics.clone(),
        ));

        let query_config = QueryServerConfig {
            host: "0.0.0.0".to_string(),
            port: config.service.query_port,
            service_name: config.service.name.clone(),
        };
        let query_server = Arc::new(QueryServer::new(query_config, engine.clone(), metrics));

        Ok(Self {
            config,
            engine,
            query_server,
            background_tasks: Vec::new(),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Start the service: brings up the query server in the background
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting service components...");

        let query_server = self.query_server.clone();
        let query_task = tokio::spawn(async move {
            if let Err(e) = query_server.start().await {
                error!("Query server failed: {}", e);
            }
        });
        self.background_tasks.push(query_task);

        *self.is_running.write().await = true;
        info!("Service started");
        Ok(())
    }

    /// Stop the service and its background tasks
    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping service components...");

        self.query_server.stop();
        for task in self.background_tasks.drain(..) {
            task.abort();
        }

        *self.is_running.write().await = false;
        info!("Service stopped");
        Ok(())
    }

    /// Whether the service is currently running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// The matchmaking engine, for transports and health checks
    pub fn engine(&self) -> Arc<MatchmakingEngine> {
        self.engine.clone()
    }

    /// Application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
