use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use lifecycle::Service;

use crate::config::DatabaseConfig;
use crate::database::Database;

/// Owns the database pool for the lifetime of the application.
pub struct DatabaseService {
    config: DatabaseConfig,
    database: Mutex<Option<Arc<Database>>>,
}

impl DatabaseService {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            database: Mutex::new(None),
        }
    }

    /// Handle to the connected pool; `None` before `start`.
    pub async fn database(&self) -> Option<Arc<Database>> {
        self.database.lock().await.clone()
    }
}

#[async_trait]
impl Service for DatabaseService {
    fn name(&self) -> &str {
        "database"
    }

    async fn start(&self) -> Result<()> {
        let database = Database::connect(&self.config).await?;
        *self.database.lock().await = Some(Arc::new(database));
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(database) = self.database.lock().await.take() {
            database.close().await;
            info!("Database pool closed");
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        match self.database.lock().await.clone() {
            Some(database) => database.ping().await,
            None => Err(anyhow!("database is not connected")),
        }
    }
}
