use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, error, info, instrument};

use crate::config::RedisConfig;

#[derive(Debug, thiserror::Error)]
pub enum RedisError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Operation error: {0}")]
    OperationError(String),
}

/// Window counter state after a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterHit {
    pub count: u64,
    /// Seconds until the counter resets
    pub ttl_secs: u64,
}

#[derive(Clone)]
pub struct RedisService {
    connection_manager: ConnectionManager,
    config: RedisConfig,
}

impl RedisService {
    #[instrument(skip(config), fields(prefix = %config.key_prefix))]
    pub async fn new(config: RedisConfig) -> Result<Self, RedisError> {
        info!("Initializing Redis service");
        config.validate().map_err(|e| RedisError::ConfigError(e.to_string()))?;

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            RedisError::ConnectionError(format!("Client creation failed: {}", e))
        })?;

        let connection_manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to create Redis connection manager: {}", e);
            RedisError::ConnectionError(format!("Connection manager creation failed: {}", e))
        })?;

        let service = RedisService { connection_manager, config };
        service.ping().await?;
        info!("Redis service initialized successfully");
        Ok(service)
    }

    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut conn = self.connection_manager.clone();
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| RedisError::OperationError(format!("Ping failed: {}", e)))?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(RedisError::OperationError(format!("Unexpected ping response: {}", reply)))
        }
    }

    pub fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }

    /// INCR the key, and start its expiry if the key has none (first hit of
    /// a window, or a previous EXPIRE that never landed).
    #[instrument(skip(self), fields(key = %key))]
    pub async fn increment_window(&self, key: &str, window_secs: u64) -> Result<CounterHit, RedisError> {
        let mut conn = self.connection_manager.clone();
        let count: u64 = conn
            .incr(key, 1u64)
            .await
            .map_err(|e| RedisError::OperationError(format!("INCR failed: {}", e)))?;

        let ttl: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| RedisError::OperationError(format!("TTL failed: {}", e)))?;

        let ttl_secs = if ttl < 0 {
            let _: bool = conn
                .expire(key, window_secs as i64)
                .await
                .map_err(|e| RedisError::OperationError(format!("EXPIRE failed: {}", e)))?;
            window_secs
        } else {
            ttl as u64
        };

        debug!(count, ttl_secs, "Window counter incremented");
        Ok(CounterHit { count, ttl_secs })
    }
}
