//! Shared MongoDB client construction and liveness checks.

use std::time::Duration;

use async_trait::async_trait;
use bson::doc;
use mongodb::{
    options::{ClientOptions, Credential, ResolverConfig},
    Client,
};
use tracing::{error, info, instrument, warn};

use crate::config::MongoConfig;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

/// Build a client from config. No I/O happens until the first operation.
pub async fn connect(config: &MongoConfig) -> RepositoryResult<Client> {
    let mut client_options = ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare())
        .await
        .map_err(|e| RepositoryError::unavailable(format!("Invalid MongoDB URI: {}", e)))?;
    client_options.app_name = Some("BcmBackend".to_string());
    client_options.max_pool_size = Some(config.pool_size);
    client_options.connect_timeout = Some(Duration::from_secs(config.connection_timeout_secs));
    client_options.server_selection_timeout = Some(Duration::from_secs(config.connection_timeout_secs));

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client_options.credential = Some(
            Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build(),
        );
    }

    Client::with_options(client_options).map_err(RepositoryError::from)
}

/// Anything whose reachability `/health` reports on.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> RepositoryResult<()>;
}

pub struct MongoHealth {
    client: Client,
}

impl MongoHealth {
    pub fn new(client: Client) -> Self {
        MongoHealth { client }
    }
}

#[async_trait]
impl StoreHealth for MongoHealth {
    async fn ping(&self) -> RepositoryResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map(|_| ())
            .map_err(RepositoryError::from)
    }
}

/// Delay before retry `attempt` (0-based): base, 2x base, 4x base, ...
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(1u64 << attempt.min(16)))
}

/// Ping until the store answers or `max_attempts` pings have failed.
/// Returns whether the store is reachable; the caller keeps running either
/// way and `/health` reports the outcome.
#[instrument(skip(store))]
pub async fn wait_for_store(store: &dyn StoreHealth, max_attempts: u32, base_delay_ms: u64) -> bool {
    let attempts = max_attempts.max(1);
    for attempt in 0..attempts {
        match store.ping().await {
            Ok(()) => {
                info!(attempt = attempt + 1, "Database connection is active");
                return true;
            }
            Err(e) if e.is_transient() && attempt + 1 < attempts => {
                let delay = backoff_delay(base_delay_ms, attempt);
                warn!(attempt = attempt + 1, error = %e, "Database ping failed, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!(attempt = attempt + 1, error = %e, "Database unreachable, starting in degraded mode");
                break;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyStore {
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl StoreHealth for FlakyStore {
        async fn ping(&self) -> RepositoryResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(RepositoryError::unavailable("refused"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(100, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(100, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(100, 3), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let store = FlakyStore { failures_left: AtomicU32::new(2), calls: AtomicU32::new(0) };
        assert!(wait_for_store(&store, 5, 1).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    struct RejectingStore {
        calls: AtomicU32,
    }

    #[async_trait]
    impl StoreHealth for RejectingStore {
        async fn ping(&self) -> RepositoryResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Rejected("unauthorized command".to_string()))
        }
    }

    #[tokio::test]
    async fn test_rejected_ping_is_not_retried() {
        let store = RejectingStore { calls: AtomicU32::new(0) };
        assert!(!wait_for_store(&store, 5, 1).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_cap() {
        let store = FlakyStore { failures_left: AtomicU32::new(10), calls: AtomicU32::new(0) };
        assert!(!wait_for_store(&store, 3, 1).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }
}
