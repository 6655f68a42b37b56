//! Read-only query surface over HTTP
//!
//! Thin Axum server exposing the configured map list, queue status with a
//! derived wait-time estimate, engine statistics, a health report, and
//! Prometheus metrics. Strictly read-only: no endpoint mutates engine state.

use crate::engine::MatchmakingEngine;
use crate::metrics::MetricsCollector;
use crate::service::health::HealthReport;
use crate::utils::ceil_div;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Query server configuration
#[derive(Debug, Clone)]
pub struct QueryServerConfig {
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
    /// Port to bind the query server to
    pub port: u16,
    /// Service name reported by /health
    pub service_name: String,
}

impl Default for QueryServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            service_name: "ready-room".to_string(),
        }
    }
}

/// Shared state for the query server
#[derive(Clone)]
pub struct QueryState {
    pub engine: Arc<MatchmakingEngine>,
    pub metrics: Arc<MetricsCollector>,
    pub service_name: String,
}

/// HTTP server for the read-only query endpoints
pub struct QueryServer {
    config: QueryServerConfig,
    state: QueryState,
    shutdown_tx: broadcast::Sender<()>,
}

impl QueryServer {
    /// Create a new query server
    pub fn new(
        config: QueryServerConfig,
        engine: Arc<MatchmakingEngine>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let service_name = config.service_name.clone();

        Self {
            config,
            state: QueryState {
                engine,
                metrics,
                service_name,
            },
            shutdown_tx,
        }
    }

    /// Start serving; returns once a shutdown signal is received
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid query server address")?;

        let app = self.create_router();
        let listener = TcpListener::bind(addr).await?;

        info!("Query server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("Query server shutdown signal received");
            })
            .await?;

        info!("Query server stopped");
        Ok(())
    }

    /// Create the Axum router with all query endpoints
    pub fn create_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/maps", get(maps_handler))
            .route("/queue/status", get(queue_status_handler))
            .route("/stats", get(stats_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state.clone())
    }

    /// Stop the query server
    pub fn stop(&self) {
        if self.shutdown_tx.send(()).is_err() {
            warn!("Query server was not running when stop was requested");
        }
    }
}

/// Queue status response, matching the legacy wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueStatus {
    players_in_queue: usize,
    /// Derived estimate in seconds: ceil(queued / batch_size) * unit
    estimated_wait_time: u64,
}

async fn root_handler(State(state): State<QueryState>) -> impl IntoResponse {
    Json(json!({
        "service": state.service_name,
        "version": crate::VERSION,
        "endpoints": ["/maps", "/queue/status", "/stats", "/health", "/metrics"],
    }))
}

async fn maps_handler(State(state): State<QueryState>) -> impl IntoResponse {
    Json(state.engine.settings().available_maps.clone())
}

async fn queue_status_handler(State(state): State<QueryState>) -> impl IntoResponse {
    let settings = state.engine.settings();
    match state.engine.queue_len() {
        Ok(queued) => {
            let batches = ceil_div(queued, settings.batch_size);
            let status = QueueStatus {
                players_in_queue: queued,
                estimated_wait_time: batches as u64 * settings.wait_estimate_unit_seconds,
            };
            (StatusCode::OK, Json(json!(status)))
        }
        Err(e) => {
            warn!("Queue status query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "queue state unavailable"})),
            )
        }
    }
}

async fn stats_handler(State(state): State<QueryState>) -> impl IntoResponse {
    match state.engine.stats() {
        Ok(stats) => (StatusCode::OK, Json(json!(stats))),
        Err(e) => {
            warn!("Stats query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "engine stats unavailable"})),
            )
        }
    }
}

async fn health_handler(State(state): State<QueryState>) -> impl IntoResponse {
    let report = HealthReport::check(&state.engine, &state.service_name);
    let code = match report.status {
        crate::service::health::HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (code, Json(json!(report)))
}

async fn metrics_handler(State(state): State<QueryState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let families = state.metrics.registry().gather();
    let mut buffer = Vec::new();

    match encoder.encode(&families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", encoder.format_type().to_string())],
            buffer,
        ),
        Err(e) => {
            warn!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain".to_string())],
                Vec::new(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchmakingSettings;
    use crate::notify::RecordingNotifier;

    fn create_test_server() -> QueryServer {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let engine = Arc::new(MatchmakingEngine::with_metrics(
            MatchmakingSettings::default(),
            Arc::new(RecordingNotifier::new()),
            metrics.clone(),
        ));
        QueryServer::new(QueryServerConfig::default(), engine, metrics)
    }

    #[test]
    fn test_router_builds() {
        let server = create_test_server();
        let _router = server.create_router();
    }

    #[test]
    fn test_maps_handler_responds_ok() {
        let server = create_test_server();
        let response =
            tokio_test::block_on(maps_handler(State(server.state.clone()))).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_health_handler_reports_healthy() {
        let server = create_test_server();
        let response =
            tokio_test::block_on(health_handler(State(server.state.clone()))).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_queue_status_wire_shape() {
        let status = QueueStatus {
            players_in_queue: 3,
            estimated_wait_time: 120,
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["playersInQueue"], 3);
        assert_eq!(value["estimatedWaitTime"], 120);
    }

    #[test]
    fn test_stop_before_start_is_harmless() {
        let server = create_test_server();
        server.stop();
    }
}
