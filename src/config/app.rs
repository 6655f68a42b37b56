//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! ready-room matchmaking service, including environment variable loading,
//! TOML file loading, and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default map pool, matching the classic five-map competitive rotation
pub const DEFAULT_MAPS: [&str; 5] = ["dust2", "mirage", "inferno", "overpass", "nuke"];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub matchmaking: MatchmakingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for the read-only query/health endpoint
    pub query_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Number of players extracted per match; must be even and at least 2
    pub batch_size: usize,
    /// Ordered set of map names players can vote on
    pub available_maps: Vec<String>,
    /// Elo substituted when a join payload carries none
    pub default_elo: i32,
    /// Seconds per queued batch used in the wait-time estimate
    pub wait_estimate_unit_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            matchmaking: MatchmakingSettings::default(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "ready-room".to_string(),
            log_level: "info".to_string(),
            query_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            available_maps: DEFAULT_MAPS.iter().map(|m| m.to_string()).collect(),
            default_elo: 1000,
            wait_estimate_unit_seconds: 120,
        }
    }
}

impl MatchmakingSettings {
    /// Number of players per team
    pub fn team_size(&self) -> usize {
        self.batch_size / 2
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
        if let Ok(port) = env::var("QUERY_PORT") {
            config.service.query_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid QUERY_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Matchmaking settings
        if let Ok(batch) = env::var("BATCH_SIZE") {
            config.matchmaking.batch_size = batch
                .parse()
                .map_err(|_| anyhow!("Invalid BATCH_SIZE value: {}", batch))?;
        }
        if let Ok(maps) = env::var("AVAILABLE_MAPS") {
            config.matchmaking.available_maps = maps
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }
        if let Ok(elo) = env::var("DEFAULT_ELO") {
            config.matchmaking.default_elo = elo
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_ELO value: {}", elo))?;
        }
        if let Ok(unit) = env::var("WAIT_ESTIMATE_UNIT_SECONDS") {
            config.matchmaking.wait_estimate_unit_seconds = unit
                .parse()
                .map_err(|_| anyhow!("Invalid WAIT_ESTIMATE_UNIT_SECONDS value: {}", unit))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then validate
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.query_port == 0 {
        return Err(anyhow!("Query port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate matchmaking settings
    let batch = config.matchmaking.batch_size;
    if batch < 2 {
        return Err(anyhow!("Batch size must be at least 2, got {}", batch));
    }
    if batch % 2 != 0 {
        return Err(anyhow!("Batch size must be even, got {}", batch));
    }

    let maps = &config.matchmaking.available_maps;
    if maps.is_empty() {
        return Err(anyhow!("Available map list cannot be empty"));
    }
    let mut seen = std::collections::HashSet::new();
    for map in maps {
        if map.is_empty() {
            return Err(anyhow!("Map names cannot be empty"));
        }
        if !seen.insert(map.as_str()) {
            return Err(anyhow!("Duplicate map name: {}", map));
        }
    }

    if config.matchmaking.wait_estimate_unit_seconds == 0 {
        return Err(anyhow!("Wait estimate unit must be greater than 0"));
    }

    Ok(())
}
