use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// MongoDB configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// MongoDB connection URI
    pub uri: String,
    /// Database name
    pub database: String,
    /// Username for authentication (optional)
    pub username: Option<String>,
    /// Password for authentication (optional)
    pub password: Option<String>,
    pub enquiry_collection: String,
    pub contact_collection: String,
    pub user_collection: String,
    /// Connection pool size
    pub pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Startup ping attempts before the server starts degraded
    pub connect_retries: u32,
    /// First retry delay; doubles on every attempt
    pub retry_base_delay_ms: u64,
}

fn env_or_default<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError> {
    env::var(key)
        .unwrap_or_else(|_| {
            warn!("{} not set, using default: {}", key, default);
            default.to_string()
        })
        .parse::<T>()
        .map_err(|_| {
            error!("Invalid {} value", key);
            ConfigError::InvalidValue(format!("Invalid {} value", key))
        })
}

impl MongoConfig {
    /// Load MongoDB configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MONGO_URI: MongoDB connection URI (required)
    /// - MONGO_DATABASE: Database name (required)
    /// - MONGO_ENQUIRY_COLLECTION / MONGO_CONTACT_COLLECTION / MONGO_USER_COLLECTION (optional)
    /// - MONGO_POOL_SIZE: Connection pool size (defaults to 10)
    /// - MONGO_CONNECTION_TIMEOUT: Connection timeout in seconds (defaults to 5)
    /// - MONGO_CONNECT_RETRIES: Startup ping attempts (defaults to 5)
    /// - MONGO_RETRY_BASE_DELAY_MS: First retry delay in milliseconds (defaults to 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MongoDB configuration from environment variables");

        let uri = env::var("MONGO_URI")
            .map_err(|_| {
                error!("MONGO_URI environment variable not found");
                ConfigError::EnvVarNotFound("MONGO_URI".to_string())
            })?;

        let database = env::var("MONGO_DATABASE")
            .map_err(|_| {
                error!("MONGO_DATABASE environment variable not found");
                ConfigError::EnvVarNotFound("MONGO_DATABASE".to_string())
            })?;
        debug!("MongoDB database: {}", database);

        let username = env::var("MONGO_USERNAME").ok();
        let password = env::var("MONGO_PASSWORD").ok();
        if password.is_some() {
            debug!("MongoDB password provided");
        }

        let enquiry_collection = env::var("MONGO_ENQUIRY_COLLECTION").unwrap_or_else(|_| "enquiries".to_string());
        let contact_collection = env::var("MONGO_CONTACT_COLLECTION").unwrap_or_else(|_| "contacts".to_string());
        let user_collection = env::var("MONGO_USER_COLLECTION").unwrap_or_else(|_| "users".to_string());
        debug!(
            "MongoDB collections: enquiries={}, contacts={}, users={}",
            enquiry_collection, contact_collection, user_collection
        );

        let pool_size = env_or_default::<u32>("MONGO_POOL_SIZE", "10")?;
        let connection_timeout_secs = env_or_default::<u64>("MONGO_CONNECTION_TIMEOUT", "5")?;
        let connect_retries = env_or_default::<u32>("MONGO_CONNECT_RETRIES", "5")?;
        let retry_base_delay_ms = env_or_default::<u64>("MONGO_RETRY_BASE_DELAY_MS", "1000")?;

        let config = MongoConfig {
            uri,
            database,
            username,
            password,
            enquiry_collection,
            contact_collection,
            user_collection,
            pool_size,
            connection_timeout_secs,
            connect_retries,
            retry_base_delay_ms,
        };

        config.validate()?;
        info!("MongoDB configuration loaded successfully");
        Ok(config)
    }

    /// Create MongoConfig for testing
    pub fn from_test_env() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "bcm_test".to_string(),
            username: None,
            password: None,
            enquiry_collection: "test_enquiries".to_string(),
            contact_collection: "test_contacts".to_string(),
            user_collection: "test_users".to_string(),
            pool_size: 2,
            connection_timeout_secs: 2,
            connect_retries: 1,
            retry_base_delay_ms: 10,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        info!("Validating MongoDB configuration");

        if self.uri.is_empty() {
            error!("MongoDB URI is empty");
            return Err(ConfigError::ValidationError("MongoDB URI cannot be empty".to_string()));
        }

        if self.database.is_empty() {
            error!("MongoDB database is empty");
            return Err(ConfigError::ValidationError("MongoDB database cannot be empty".to_string()));
        }

        for (name, value) in [
            ("enquiry", &self.enquiry_collection),
            ("contact", &self.contact_collection),
            ("user", &self.user_collection),
        ] {
            if value.is_empty() {
                error!("MongoDB {} collection name is empty", name);
                return Err(ConfigError::ValidationError(format!("MongoDB {} collection cannot be empty", name)));
            }
        }

        if self.pool_size == 0 {
            error!("MongoDB pool size is 0");
            return Err(ConfigError::ValidationError("MongoDB pool size must be greater than 0".to_string()));
        }

        if self.connection_timeout_secs == 0 {
            error!("MongoDB connection timeout is 0");
            return Err(ConfigError::ValidationError("MongoDB connection timeout must be greater than 0".to_string()));
        }

        if self.connect_retries == 0 {
            return Err(ConfigError::ValidationError("MONGO_CONNECT_RETRIES must be at least 1".to_string()));
        }

        if let Some(ref user) = self.username {
            if user.is_empty() {
                error!("MongoDB username is empty");
                return Err(ConfigError::ValidationError("MongoDB username cannot be empty if set".to_string()));
            }
        }
        if let Some(ref pass) = self.password {
            if pass.is_empty() {
                error!("MongoDB password is empty");
                return Err(ConfigError::ValidationError("MongoDB password cannot be empty if set".to_string()));
            }
        }
        info!("MongoDB configuration validation successful");
        Ok(())
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "bcm".to_string(),
            username: None,
            password: None,
            enquiry_collection: "enquiries".to_string(),
            contact_collection: "contacts".to_string(),
            user_collection: "users".to_string(),
            pool_size: 10,
            connection_timeout_secs: 5,
            connect_retries: 5,
            retry_base_delay_ms: 1000,
        }
    }
}
