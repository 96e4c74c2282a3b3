mod loader;

pub use loader::load_config;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use lifecycle::ManagerOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    /// One of "development", "production", "testing".
    pub environment: String,
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection string, e.g. `sqlite://app.db?mode=rwc`.
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// One of "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// "text" or "json".
    pub format: String,
}

/// Timeouts for the lifecycle manager, all optional in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub start_timeout_seconds: u64,
    pub stop_timeout_seconds: u64,
    pub rollback_timeout_seconds: u64,
    pub health_interval_seconds: u64,
    pub health_timeout_seconds: u64,
    pub status_timeout_seconds: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_seconds: 30,
            stop_timeout_seconds: 30,
            rollback_timeout_seconds: 10,
            health_interval_seconds: 30,
            health_timeout_seconds: 10,
            status_timeout_seconds: 5,
        }
    }
}

impl LifecycleConfig {
    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            start_timeout: Duration::from_secs(self.start_timeout_seconds),
            stop_timeout: Duration::from_secs(self.stop_timeout_seconds),
            rollback_timeout: Duration::from_secs(self.rollback_timeout_seconds),
            health_interval: Duration::from_secs(self.health_interval_seconds),
            health_timeout: Duration::from_secs(self.health_timeout_seconds),
            status_timeout: Duration::from_secs(self.status_timeout_seconds),
            trap_signals: true,
        }
    }
}
