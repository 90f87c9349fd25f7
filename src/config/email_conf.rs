//! Outbound mail settings for lead acknowledgments and operator alerts.

use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Cleartext, for local relays such as MailHog
    Plain,
    /// Upgrade a cleartext connection (port 587)
    StartTls,
    /// TLS from the first byte (port 465)
    Tls,
}

impl SmtpSecurity {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "plain" => Ok(SmtpSecurity::Plain),
            "starttls" => Ok(SmtpSecurity::StartTls),
            "tls" | "ssl" => Ok(SmtpSecurity::Tls),
            other => Err(ConfigError::InvalidValue(format!("Unknown EMAIL_SECURITY: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub security: SmtpSecurity,
    pub sender_name: String,
    pub sender_address: String,
    /// Mailbox that receives new-lead alerts
    pub operator_address: String,
    pub timeout_secs: u64,
}

fn required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| {
        error!("{} environment variable not found", key);
        ConfigError::EnvVarNotFound(key.to_string())
    })
}

impl EmailConfig {
    /// Expected environment variables:
    /// - EMAIL_HOST, EMAIL_USER, EMAIL_PASS: relay and login (required)
    /// - EMAIL_PORT: defaults to 587
    /// - EMAIL_SECURITY: starttls | tls | none (defaults to starttls)
    /// - EMAIL_FROM / EMAIL_FROM_NAME: sender, defaults to EMAIL_USER / "BCM Group"
    /// - ADMIN_NOTIFICATION_EMAIL: alert recipient, defaults to the sender
    /// - EMAIL_TIMEOUT_SECS: defaults to 30
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading email configuration from environment variables");

        let host = required("EMAIL_HOST")?;
        let username = required("EMAIL_USER")?;
        let password = required("EMAIL_PASS")?;

        let port = match env::var("EMAIL_PORT") {
            Ok(v) => v
                .parse::<u16>()
                .map_err(|e| ConfigError::ParseError(format!("EMAIL_PORT: {}", e)))?,
            Err(_) => 587,
        };
        let security = match env::var("EMAIL_SECURITY") {
            Ok(v) => SmtpSecurity::parse(&v)?,
            Err(_) => SmtpSecurity::StartTls,
        };
        let timeout_secs = match env::var("EMAIL_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|e| ConfigError::ParseError(format!("EMAIL_TIMEOUT_SECS: {}", e)))?,
            Err(_) => 30,
        };

        let sender_address = env::var("EMAIL_FROM").unwrap_or_else(|_| username.clone());
        let sender_name = env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "BCM Group".to_string());
        let operator_address = env::var("ADMIN_NOTIFICATION_EMAIL").unwrap_or_else(|_| {
            warn!("ADMIN_NOTIFICATION_EMAIL not set, alerts go to {}", sender_address);
            sender_address.clone()
        });

        let config = EmailConfig {
            host,
            port,
            username,
            password,
            security,
            sender_name,
            sender_address,
            operator_address,
            timeout_secs,
        };
        debug!(host = %config.host, port = config.port, security = ?config.security, "Email relay");

        config.validate()?;
        Ok(config)
    }

    /// Local relay without authentication.
    pub fn from_test_env() -> Self {
        EmailConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: String::new(),
            password: String::new(),
            security: SmtpSecurity::Plain,
            sender_name: "BCM Group".to_string(),
            sender_address: "noreply@bcm.test".to_string(),
            operator_address: "ops@bcm.test".to_string(),
            timeout_secs: 5,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let problem = if self.host.is_empty() {
            Some("EMAIL_HOST cannot be empty")
        } else if self.port == 0 {
            Some("EMAIL_PORT cannot be 0")
        } else if !self.sender_address.contains('@') {
            Some("Sender must be an email address")
        } else if !self.operator_address.contains('@') {
            Some("ADMIN_NOTIFICATION_EMAIL must be an email address")
        } else if self.timeout_secs == 0 {
            Some("EMAIL_TIMEOUT_SECS cannot be 0")
        } else {
            None
        };

        match problem {
            Some(msg) => {
                error!("{}", msg);
                Err(ConfigError::ValidationError(msg.to_string()))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_modes() {
        assert_eq!(SmtpSecurity::parse("STARTTLS").unwrap(), SmtpSecurity::StartTls);
        assert_eq!(SmtpSecurity::parse("ssl").unwrap(), SmtpSecurity::Tls);
        assert_eq!(SmtpSecurity::parse("none").unwrap(), SmtpSecurity::Plain);
        assert!(SmtpSecurity::parse("maybe").is_err());
    }

    #[test]
    fn test_local_relay_is_valid_without_credentials() {
        let config = EmailConfig::from_test_env();
        assert!(config.validate().is_ok());
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_rejects_missing_host_and_bad_addresses() {
        let mut config = EmailConfig::from_test_env();
        config.host.clear();
        assert!(config.validate().is_err());

        let mut config = EmailConfig::from_test_env();
        config.operator_address = "operator".to_string();
        assert!(config.validate().is_err());

        let mut config = EmailConfig::from_test_env();
        config.port = 0;
        assert!(config.validate().is_err());
    }
}
