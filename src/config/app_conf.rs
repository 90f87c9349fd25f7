use std::env;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::ConfigError;

/// Origins the marketing frontend is served from during local development.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 6] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:8080",
    "http://localhost:5173",
    "http://127.0.0.1:8080",
    "http://127.0.0.1:5173",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnvironment::Development),
            "production" | "prod" => Ok(AppEnvironment::Production),
            other => Err(ConfigError::InvalidValue(format!("Unknown APP_ENV: {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
        }
    }

    /// Verbose error details are only exposed outside production.
    pub fn is_development(&self) -> bool {
        matches!(self, AppEnvironment::Development)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: AppEnvironment,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Expected environment variables:
    /// - APP_HOST (defaults to 127.0.0.1)
    /// - APP_PORT (defaults to 5000)
    /// - APP_ENV: development | production (defaults to development)
    /// - CORS_ALLOWED_ORIGINS: comma separated list (defaults to the local dev origins)
    /// - FRONTEND_URL: appended to the allowed origins when set
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading application configuration from environment variables");

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| {
                warn!("APP_PORT not set, using default: 5000");
                "5000".to_string()
            })
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("Invalid APP_PORT value".to_string()))?;

        let environment = match env::var("APP_ENV") {
            Ok(value) => AppEnvironment::parse(&value)?,
            Err(_) => {
                warn!("APP_ENV not set, defaulting to development");
                AppEnvironment::Development
            }
        };
        debug!("Application environment: {}", environment);

        let mut allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => parse_origins(&value),
            Err(_) => DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };
        if let Ok(frontend) = env::var("FRONTEND_URL") {
            let frontend = frontend.trim().trim_end_matches('/').to_string();
            if !frontend.is_empty() && !allowed_origins.contains(&frontend) {
                allowed_origins.push(frontend);
            }
        }
        debug!("Allowed CORS origins: {:?}", allowed_origins);

        let config = AppConfig { host, port, environment, allowed_origins };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::ValidationError("APP_HOST cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError("APP_PORT cannot be 0".to_string()));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            environment: AppEnvironment::Development,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
