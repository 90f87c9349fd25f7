use std::env;
use serde::{Serialize, Deserialize};
use crate::config::ConfigError;

/// Bootstrap admin account, created at startup when missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl AdminUserConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = AdminUserConfig {
            username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            email: env::var("ADMIN_EMAIL").map_err(|_| ConfigError::EnvVarNotFound("ADMIN_EMAIL".to_string()))?,
            password: env::var("ADMIN_PASSWORD").map_err(|_| ConfigError::EnvVarNotFound("ADMIN_PASSWORD".to_string()))?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.email.contains('@') {
            return Err(ConfigError::ValidationError("ADMIN_EMAIL must be an email address".to_string()));
        }
        if self.password.len() < 8 {
            return Err(ConfigError::ValidationError("ADMIN_PASSWORD must be at least 8 characters".to_string()));
        }
        Ok(())
    }
}
