use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// JWT configuration structure
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// JWT secret key for signing tokens
    pub jwt_secret: String,
    /// Access token expiration time in minutes
    pub access_token_expiration: i64,
    /// Refresh token expiration time in minutes
    pub refresh_token_expiration: i64,
    /// Maximum age of an admin session, counted from login, in minutes
    pub session_max_age: i64,
    /// JWT issuer (optional)
    pub jwt_issuer: Option<String>,
}

fn minutes_from_env(key: &str, default: &str) -> Result<i64, ConfigError> {
    let value = env::var(key)
        .unwrap_or_else(|_| {
            warn!("{} not set, using default: {} minutes", key, default);
            default.to_string()
        })
        .parse::<i64>()
        .map_err(|e| {
            error!("Invalid {} value: {}", key, e);
            ConfigError::ParseError(format!("{}: {}", key, e))
        })?;
    if value <= 0 {
        error!("{} must be greater than 0", key);
        return Err(ConfigError::InvalidValue(format!("{} must be greater than 0", key)));
    }
    Ok(value)
}

impl JwtConfig {
    /// Load JWT configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JWT_SECRET: Secret key for signing JWT tokens (required, at least 32 characters)
    /// - JWT_ACCESS_TOKEN_EXPIRY: Access token expiration in minutes (defaults to 1440 = 24 hours)
    /// - JWT_REFRESH_TOKEN_EXPIRY: Refresh token expiration in minutes (defaults to 10080 = 1 week)
    /// - ADMIN_SESSION_MAX_AGE: Session age limit in minutes (defaults to 1440)
    /// - JWT_ISSUER: JWT issuer (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading JWT configuration from environment variables");

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| {
                error!("JWT_SECRET environment variable not found");
                ConfigError::EnvVarNotFound("JWT_SECRET".to_string())
            })?;
        debug!("JWT secret loaded (length: {} chars)", jwt_secret.len());

        let access_token_expiration = minutes_from_env("JWT_ACCESS_TOKEN_EXPIRY", "1440")?;
        let refresh_token_expiration = minutes_from_env("JWT_REFRESH_TOKEN_EXPIRY", "10080")?;
        let session_max_age = minutes_from_env("ADMIN_SESSION_MAX_AGE", "1440")?;

        let jwt_issuer = env::var("JWT_ISSUER").ok();
        if let Some(ref issuer) = jwt_issuer {
            debug!("JWT issuer: {}", issuer);
        }

        let config = JwtConfig {
            jwt_secret,
            access_token_expiration,
            refresh_token_expiration,
            session_max_age,
            jwt_issuer,
        };

        config.validate()?;
        info!("JWT configuration loaded successfully");
        Ok(config)
    }

    /// Validate the JWT configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        debug!("Validating JWT configuration");

        if self.jwt_secret.is_empty() {
            error!("JWT secret cannot be empty");
            return Err(ConfigError::ValidationError("JWT secret cannot be empty".to_string()));
        }

        if self.jwt_secret.len() < 32 {
            error!("JWT secret is too short (minimum 32 characters required)");
            return Err(ConfigError::ValidationError("JWT secret must be at least 32 characters long".to_string()));
        }

        if self.access_token_expiration <= 0 || self.refresh_token_expiration <= 0 || self.session_max_age <= 0 {
            error!("Token lifetimes must be greater than 0");
            return Err(ConfigError::ValidationError("Token lifetimes must be greater than 0".to_string()));
        }

        if self.access_token_expiration >= self.refresh_token_expiration {
            warn!("Access token expiration is greater than or equal to refresh token expiration");
        }

        debug!("JWT configuration validation passed");
        Ok(())
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        JwtConfig {
            jwt_secret: "test_secret_key_for_jwt_testing_should_be_long_enough_for_security_purposes".to_string(),
            access_token_expiration: 1440,
            refresh_token_expiration: 10080, // 1 week
            session_max_age: 1440,
            jwt_issuer: Some("bcm-backend".to_string()),
        }
    }
}
