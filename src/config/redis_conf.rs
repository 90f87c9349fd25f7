use std::env;
use tracing::{error, info};

use crate::config::ConfigError;

/// Shared counter store, only read when `RATE_LIMIT_BACKEND=redis`.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `redis://[user:pass@]host:port/db`, or `rediss://` for TLS
    pub url: String,
    /// Namespace in front of every counter key
    pub key_prefix: String,
}

impl RedisConfig {
    /// Expected environment variables:
    /// - REDIS_URL: connection URL (required)
    /// - REDIS_KEY_PREFIX: defaults to "bcm:ratelimit"
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading Redis configuration from environment variables");

        let url = env::var("REDIS_URL").map_err(|_| {
            error!("REDIS_URL is required for the redis rate-limit backend");
            ConfigError::EnvVarNotFound("REDIS_URL".to_string())
        })?;
        let key_prefix = env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "bcm:ratelimit".to_string());

        let config = RedisConfig { url, key_prefix };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.url.starts_with("redis://") || self.url.starts_with("rediss://")) {
            return Err(ConfigError::ValidationError(
                "REDIS_URL must start with redis:// or rediss://".to_string(),
            ));
        }
        if self.key_prefix.is_empty() {
            return Err(ConfigError::ValidationError("REDIS_KEY_PREFIX cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            url: "redis://127.0.0.1:6379/0".to_string(),
            key_prefix: "bcm:ratelimit".to_string(),
        }
    }
}
