// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Enable demo mode (simulated device streams, in-memory backend)
    pub demo_mode: bool,

    /// Engine schedules
    pub engine: EngineConfig,

    /// Fall detection thresholds
    pub fall: FallConfig,

    /// Geofence settings
    pub geofence: GeofenceConfig,

    /// Backend connection
    pub backend: BackendConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            demo_mode: false,
            engine: EngineConfig::default(),
            fall: FallConfig::default(),
            geofence: GeofenceConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("vigil"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Engine schedules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Automatic heartbeat period in minutes
    pub heartbeat_minutes: u64,

    /// Alert escalation countdown in seconds
    pub countdown_seconds: u64,

    /// Server reconciliation poll period in seconds
    pub poll_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heartbeat_minutes: 45,
            countdown_seconds: 30,
            poll_seconds: 60,
        }
    }
}

impl EngineConfig {
    /// Heartbeat period as a [`Duration`].
    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.heartbeat_minutes * 60)
    }

    /// Countdown window as a [`Duration`].
    pub fn countdown_duration(&self) -> Duration {
        Duration::from_secs(self.countdown_seconds)
    }

    /// Poll period as a [`Duration`].
    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_seconds)
    }
}

/// Fall detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallConfig {
    /// Acceleration magnitude threshold in m/s^2
    pub threshold: f64,

    /// Quiet period after the last spike before a candidate fires, in seconds
    pub settle_seconds: u64,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            threshold: 25.0,
            settle_seconds: 30,
        }
    }
}

impl FallConfig {
    /// Settle window as a [`Duration`].
    pub fn settle_period(&self) -> Duration {
        Duration::from_secs(self.settle_seconds)
    }
}

/// Geofence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceConfig {
    /// Radius used when creating a zone without an explicit one, in meters
    pub default_radius_meters: u32,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            default_radius_meters: 200,
        }
    }
}

/// Backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the safety API
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl BackendConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_monitoring_schedules() {
        let config = Config::default();
        assert_eq!(config.engine.heartbeat_period(), Duration::from_secs(45 * 60));
        assert_eq!(config.engine.countdown_duration(), Duration::from_secs(30));
        assert_eq!(config.engine.poll_period(), Duration::from_secs(60));
        assert_eq!(config.fall.threshold, 25.0);
        assert_eq!(config.fall.settle_period(), Duration::from_secs(30));
        assert_eq!(config.geofence.default_radius_meters, 200);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.engine.poll_seconds = 15;
        config.backend.base_url = "https://safety.example.com".to_string();

        let encoded = toml::to_string_pretty(&config).unwrap();
        let decoded: Config = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.engine.poll_seconds, 15);
        assert_eq!(decoded.backend.base_url, "https://safety.example.com");
    }

    #[test]
    fn partial_file_rejects_missing_sections() {
        // Sections carry no serde defaults: a file must be complete.
        let result: std::result::Result<Config, _> = toml::from_str("log_level = \"debug\"");
        assert!(result.is_err());
    }
}
