use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use lifecycle::Manager;
use server::config::{self, LogConfig};
use server::services::{DatabaseService, HttpService};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/app.toml".to_string());
    let config = config::load_config(&config_path).await?;

    init_tracing(&config.log)?;
    info!(
        "Starting {} v{} ({})",
        config.app.name, config.app.version, config.app.environment
    );
    info!("Configuration loaded from {}", config_path);

    let manager = Manager::new(config.lifecycle.manager_options());

    // Registration order is startup order; shutdown runs in reverse.
    manager
        .register(Arc::new(DatabaseService::new(config.database.clone())))
        .await;
    manager
        .register(Arc::new(HttpService::new(
            config.server.clone(),
            manager.clone(),
        )))
        .await;

    if let Err(err) = manager.start().await {
        anyhow::bail!("Application failed to start: {}", err);
    }

    manager.wait().await;
    info!("Application shut down");
    Ok(())
}

fn init_tracing(log: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("server={}", log.level).parse()?)
        .add_directive(format!("lifecycle={}", log.level).parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    match log.format.as_str() {
        "json" => fmt().json().with_env_filter(env_filter).init(),
        _ => fmt().with_env_filter(env_filter).init(),
    }
    Ok(())
}
