use std::env;
use tracing::{debug, info, warn};

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBackend {
    /// Per-process counters, reset on restart
    Memory,
    /// Counters shared across instances through Redis
    Redis,
}

/// Submission budgets per client address and endpoint.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub backend: RateLimitBackend,
    pub window_secs: u64,
    pub enquiry_max: u64,
    pub contact_max: u64,
    /// Key clients on the first `X-Forwarded-For` entry instead of the
    /// socket peer. Only safe behind a proxy that overwrites the header.
    pub trust_proxy: bool,
}

impl RateLimitConfig {
    /// Expected environment variables:
    /// - RATE_LIMIT_BACKEND: memory | redis (defaults to memory)
    /// - RATE_LIMIT_WINDOW_SECS: window length (defaults to 900 = 15 minutes)
    /// - RATE_LIMIT_ENQUIRY_MAX: enquiry submissions per window (defaults to 5)
    /// - RATE_LIMIT_CONTACT_MAX: contact submissions per window (defaults to 3)
    /// - TRUST_PROXY: true | false (defaults to false)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading rate limit configuration from environment variables");

        let backend = match env::var("RATE_LIMIT_BACKEND").as_deref() {
            Ok("redis") => RateLimitBackend::Redis,
            Ok("memory") | Err(_) => RateLimitBackend::Memory,
            Ok(other) => {
                return Err(ConfigError::InvalidValue(format!("Unknown RATE_LIMIT_BACKEND: {}", other)));
            }
        };

        let trust_proxy = match env::var("TRUST_PROXY").as_deref() {
            Ok("true") | Ok("1") => true,
            Ok("false") | Ok("0") | Err(_) => false,
            Ok(other) => {
                return Err(ConfigError::InvalidValue(format!("Unknown TRUST_PROXY: {}", other)));
            }
        };

        let parse = |key: &str, default: u64| -> Result<u64, ConfigError> {
            match env::var(key) {
                Ok(v) => v
                    .parse::<u64>()
                    .map_err(|e| ConfigError::ParseError(format!("{}: {}", key, e))),
                Err(_) => {
                    warn!("{} not set, using default: {}", key, default);
                    Ok(default)
                }
            }
        };

        let config = RateLimitConfig {
            backend,
            window_secs: parse("RATE_LIMIT_WINDOW_SECS", 15 * 60)?,
            enquiry_max: parse("RATE_LIMIT_ENQUIRY_MAX", 5)?,
            contact_max: parse("RATE_LIMIT_CONTACT_MAX", 3)?,
            trust_proxy,
        };
        debug!("Rate limit configuration: {:?}", config);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_secs == 0 {
            return Err(ConfigError::ValidationError("Rate limit window must be greater than 0".to_string()));
        }
        if self.enquiry_max == 0 || self.contact_max == 0 {
            return Err(ConfigError::ValidationError("Rate limit caps must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            backend: RateLimitBackend::Memory,
            window_secs: 15 * 60,
            enquiry_max: 5,
            contact_max: 3,
            trust_proxy: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_caps() {
        let config = RateLimitConfig::default();
        assert_eq!(config.window_secs, 900);
        assert_eq!(config.enquiry_max, 5);
        assert_eq!(config.contact_max, 3);
        assert_eq!(config.backend, RateLimitBackend::Memory);
        assert!(!config.trust_proxy);
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = RateLimitConfig { window_secs: 0, ..RateLimitConfig::default() };
        assert!(config.validate().is_err());
    }
}
