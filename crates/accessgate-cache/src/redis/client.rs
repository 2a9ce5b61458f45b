//! Redis connection management.

use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use accessgate_core::config::cache::RedisConfig;
use accessgate_core::error::{AppError, ErrorKind};
use accessgate_core::result::AppResult;

/// Reconnecting Redis connection plus the configured key prefix.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisClient {
    /// Connect using the `redis` configuration section.
    pub async fn connect(config: &RedisConfig) -> AppResult<Self> {
        info!(key_prefix = %config.key_prefix, "Connecting to Redis");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to create Redis client", e)
        })?;
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to connect to Redis", e)
        })?;

        info!("Successfully connected to Redis");
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// A cheap clone of the connection manager.
    pub fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Build a full key with the configured prefix.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }
}
