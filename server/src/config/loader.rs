use std::path::Path;

use anyhow::{anyhow, Result};
use tokio::fs;

use super::Config;

const VALID_ENVIRONMENTS: &[&str] = &["development", "production", "testing"];
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

/// Template written on first run when no config file exists yet.
const DEFAULT_CONFIG: &str = r#"[app]
name = "app-server"
version = "0.1.0"
environment = "development"

[server]
host = "0.0.0.0"
port = 8080
request_timeout_seconds = 30

[database]
url = "sqlite://app.db?mode=rwc"
max_connections = 5
acquire_timeout_seconds = 5

[log]
level = "info"
format = "text"

[lifecycle]
start_timeout_seconds = 30
stop_timeout_seconds = 30
rollback_timeout_seconds = 10
health_interval_seconds = 30
health_timeout_seconds = 10
status_timeout_seconds = 5
"#;

/// Load and validate the application config, creating a default file first
/// if none exists at the given path.
pub async fn load_config(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        write_default_config(path).await?;
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| anyhow!("Failed to read config {}: {}", path, e))?;

    let config: Config =
        toml::from_str(&content).map_err(|e| anyhow!("Failed to parse config {}: {}", path, e))?;

    validate(&config)?;
    Ok(config)
}

async fn write_default_config(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow!("Failed to create config directory {:?}: {}", parent, e))?;
        }
    }
    fs::write(path, DEFAULT_CONFIG)
        .await
        .map_err(|e| anyhow!("Failed to write default config {}: {}", path, e))
}

fn validate(config: &Config) -> Result<()> {
    if config.app.name.is_empty() {
        return Err(anyhow!("app.name must not be empty"));
    }
    if !VALID_ENVIRONMENTS.contains(&config.app.environment.as_str()) {
        return Err(anyhow!(
            "app.environment must be one of {:?}, got '{}'",
            VALID_ENVIRONMENTS,
            config.app.environment
        ));
    }
    if config.server.port == 0 && config.app.environment == "production" {
        return Err(anyhow!("server.port must be fixed in production"));
    }
    if config.server.request_timeout_seconds == 0 {
        return Err(anyhow!("server.request_timeout_seconds must be at least 1"));
    }
    if config.database.url.is_empty() {
        return Err(anyhow!("database.url must not be empty"));
    }
    if config.database.max_connections == 0 {
        return Err(anyhow!("database.max_connections must be at least 1"));
    }
    if !VALID_LOG_LEVELS.contains(&config.log.level.as_str()) {
        return Err(anyhow!(
            "log.level must be one of {:?}, got '{}'",
            VALID_LOG_LEVELS,
            config.log.level
        ));
    }
    if !VALID_LOG_FORMATS.contains(&config.log.format.as_str()) {
        return Err(anyhow!(
            "log.format must be one of {:?}, got '{}'",
            VALID_LOG_FORMATS,
            config.log.format
        ));
    }
    let lc = &config.lifecycle;
    for (field, value) in [
        ("lifecycle.start_timeout_seconds", lc.start_timeout_seconds),
        ("lifecycle.stop_timeout_seconds", lc.stop_timeout_seconds),
        ("lifecycle.rollback_timeout_seconds", lc.rollback_timeout_seconds),
        ("lifecycle.health_interval_seconds", lc.health_interval_seconds),
        ("lifecycle.health_timeout_seconds", lc.health_timeout_seconds),
        ("lifecycle.status_timeout_seconds", lc.status_timeout_seconds),
    ] {
        if value == 0 {
            return Err(anyhow!("{} must be at least 1", field));
        }
    }
    Ok(())
}
