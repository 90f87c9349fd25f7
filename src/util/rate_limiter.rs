//! Fixed-window submission budgets per client address and endpoint.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::HeaderMap;
use parking_lot::Mutex;
use tracing::{error, warn};

use crate::config::RateLimitConfig;
use crate::util::redis::{CounterHit, RedisError, RedisService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    EnquirySubmit,
    ContactSubmit,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::EnquirySubmit => "enquiry",
            Endpoint::ContactSubmit => "contact",
        }
    }

    pub fn limit_message(&self) -> &'static str {
        match self {
            Endpoint::EnquirySubmit => "Too many enquiry submissions, please try again later.",
            Endpoint::ContactSubmit => "Too many contact form submissions, please try again later.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u64 },
    Limited { retry_after: u64 },
}

/// Counter storage with atomic increment-and-expire semantics.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn hit(&self, key: &str, window: Duration) -> Result<CounterHit, RedisError>;
}

struct Window {
    started: Instant,
    count: u64,
}

/// Clients tracked at once by the in-memory store.
pub const MAX_TRACKED_KEYS: usize = 10_000;

/// Per-process counters. Reset on restart and not shared across instances.
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
    max_keys: usize,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::with_max_keys(MAX_TRACKED_KEYS)
    }

    pub fn with_max_keys(max_keys: usize) -> Self {
        InMemoryRateLimitStore { windows: Mutex::new(HashMap::new()), max_keys: max_keys.max(1) }
    }

    pub fn tracked(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn hit_at(&self, key: &str, window: Duration, now: Instant) -> CounterHit {
        let mut windows = self.windows.lock();
        if !windows.contains_key(key) && windows.len() >= self.max_keys {
            windows.retain(|_, w| now.duration_since(w.started) < window);
            // Still full: give up the longest-running window.
            if windows.len() >= self.max_keys {
                let oldest = windows.iter().min_by_key(|(_, w)| w.started).map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    windows.remove(&oldest);
                }
            }
        }
        let entry = windows
            .entry(key.to_string())
            .or_insert(Window { started: now, count: 0 });
        if now.duration_since(entry.started) >= window {
            entry.started = now;
            entry.count = 0;
        }
        entry.count += 1;
        let elapsed = now.duration_since(entry.started);
        CounterHit {
            count: entry.count,
            ttl_secs: window.saturating_sub(elapsed).as_secs().max(1),
        }
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &str, window: Duration) -> Result<CounterHit, RedisError> {
        Ok(self.hit_at(key, window, Instant::now()))
    }
}

/// Counters shared by every instance through Redis.
pub struct RedisRateLimitStore {
    redis: RedisService,
}

impl RedisRateLimitStore {
    pub fn new(redis: RedisService) -> Self {
        RedisRateLimitStore { redis }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(&self, key: &str, window: Duration) -> Result<CounterHit, RedisError> {
        self.redis
            .increment_window(&self.redis.namespaced(key), window.as_secs().max(1))
            .await
    }
}

pub struct RateLimiter {
    store: Box<dyn RateLimitStore>,
    window: Duration,
    enquiry_max: u64,
    contact_max: u64,
    trust_proxy: bool,
}

impl RateLimiter {
    pub fn new(store: Box<dyn RateLimitStore>, config: &RateLimitConfig) -> Self {
        RateLimiter {
            store,
            window: Duration::from_secs(config.window_secs),
            enquiry_max: config.enquiry_max,
            contact_max: config.contact_max,
            trust_proxy: config.trust_proxy,
        }
    }

    pub fn in_memory(config: &RateLimitConfig) -> Self {
        Self::new(Box::new(InMemoryRateLimitStore::new()), config)
    }

    pub fn cap(&self, endpoint: Endpoint) -> u64 {
        match endpoint {
            Endpoint::EnquirySubmit => self.enquiry_max,
            Endpoint::ContactSubmit => self.contact_max,
        }
    }

    /// Key under which a request is counted.
    pub fn client_for(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        client_address(headers, peer, self.trust_proxy)
    }

    /// Count this request against the client's budget. A store failure
    /// lets the request through.
    pub async fn check(&self, endpoint: Endpoint, client: &str) -> RateDecision {
        let key = format!("{}:{}", endpoint.as_str(), client);
        let cap = self.cap(endpoint);
        match self.store.hit(&key, self.window).await {
            Ok(hit) if hit.count > cap => {
                warn!(endpoint = endpoint.as_str(), client, count = hit.count, "Rate limit exceeded");
                RateDecision::Limited { retry_after: hit.ttl_secs }
            }
            Ok(hit) => RateDecision::Allowed { remaining: cap - hit.count },
            Err(e) => {
                error!(endpoint = endpoint.as_str(), error = %e, "Rate limit store failed, allowing request");
                RateDecision::Allowed { remaining: cap }
            }
        }
    }
}

/// Longest header value considered as an address. IPv6 text with a zone
/// index stays well below this.
const MAX_FORWARDED_LEN: usize = 64;

/// The socket peer, or the first `X-Forwarded-For` entry when the proxy is
/// trusted and that entry is an IP address.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = if trust_proxy {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| v.len() <= MAX_FORWARDED_LEN)
            .and_then(|v| v.parse::<IpAddr>().ok())
    } else {
        None
    };
    forwarded
        .or_else(|| peer.map(|p| p.ip()))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    struct BrokenStore;

    #[async_trait]
    impl RateLimitStore for BrokenStore {
        async fn hit(&self, _key: &str, _window: Duration) -> Result<CounterHit, RedisError> {
            Err(RedisError::ConnectionError("down".to_string()))
        }
    }

    #[test]
    fn test_window_resets() {
        let store = InMemoryRateLimitStore::new();
        let window = Duration::from_secs(900);
        let start = Instant::now();
        for expected in 1..=4 {
            assert_eq!(store.hit_at("k", window, start).count, expected);
        }
        let next_window = start + window;
        assert_eq!(store.hit_at("k", window, next_window).count, 1);
        assert_eq!(store.hit_at("other", window, start).count, 1);
    }

    #[tokio::test]
    async fn test_contact_cap_is_three() {
        let limiter = RateLimiter::in_memory(&RateLimitConfig::default());
        for _ in 0..3 {
            assert!(matches!(limiter.check(Endpoint::ContactSubmit, "10.0.0.1").await, RateDecision::Allowed { .. }));
        }
        assert!(matches!(
            limiter.check(Endpoint::ContactSubmit, "10.0.0.1").await,
            RateDecision::Limited { retry_after } if retry_after > 0
        ));
        // Separate budgets per endpoint and per client.
        assert!(matches!(limiter.check(Endpoint::EnquirySubmit, "10.0.0.1").await, RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check(Endpoint::ContactSubmit, "10.0.0.2").await, RateDecision::Allowed { .. }));
    }

    #[tokio::test]
    async fn test_store_failure_fails_open() {
        let limiter = RateLimiter::new(Box::new(BrokenStore), &RateLimitConfig::default());
        for _ in 0..10 {
            assert!(matches!(limiter.check(Endpoint::EnquirySubmit, "1.1.1.1").await, RateDecision::Allowed { .. }));
        }
    }

    #[test]
    fn test_store_stays_bounded() {
        let store = InMemoryRateLimitStore::with_max_keys(3);
        let window = Duration::from_secs(900);
        let start = Instant::now();
        for i in 0..10u64 {
            store.hit_at(&format!("contact:10.0.0.{}", i), window, start + Duration::from_secs(i));
        }
        assert_eq!(store.tracked(), 3);

        // The newest clients keep their counts.
        assert_eq!(store.hit_at("contact:10.0.0.9", window, start + Duration::from_secs(20)).count, 2);
    }

    #[test]
    fn test_closed_windows_are_dropped_first() {
        let store = InMemoryRateLimitStore::with_max_keys(2);
        let window = Duration::from_secs(60);
        let start = Instant::now();
        store.hit_at("stale", window, start);
        store.hit_at("busy", window, start + Duration::from_secs(50));
        store.hit_at("busy", window, start + Duration::from_secs(55));

        let later = start + Duration::from_secs(70);
        assert_eq!(store.hit_at("fresh", window, later).count, 1);
        assert_eq!(store.tracked(), 2);
        assert_eq!(store.hit_at("busy", window, later).count, 3);
    }

    #[test]
    fn test_forwarded_header_ignored_by_default() {
        let peer = Some("192.168.1.9:5123".parse().unwrap());
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));

        assert_eq!(client_address(&headers, peer, false), "192.168.1.9");
        assert_eq!(client_address(&HeaderMap::new(), peer, false), "192.168.1.9");
        assert_eq!(client_address(&headers, None, false), "unknown");
    }

    #[test]
    fn test_forwarded_header_behind_trusted_proxy() {
        let peer = Some("10.0.0.2:80".parse().unwrap());
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_address(&headers, peer, true), "203.0.113.7");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 2001:db8::1 "));
        assert_eq!(client_address(&headers, peer, true), "2001:db8::1");

        // Anything that is not an address falls back to the peer.
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_address(&headers, peer, true), "10.0.0.2");

        let long = "1".repeat(MAX_FORWARDED_LEN + 1);
        headers.insert("x-forwarded-for", HeaderValue::from_str(&long).unwrap());
        assert_eq!(client_address(&headers, peer, true), "10.0.0.2");
        assert_eq!(client_address(&headers, None, true), "unknown");
    }

    #[test]
    fn test_limiter_uses_configured_trust() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        let peer = Some("192.168.1.9:5123".parse().unwrap());

        let direct = RateLimiter::in_memory(&RateLimitConfig::default());
        assert_eq!(direct.client_for(&headers, peer), "192.168.1.9");

        let proxied = RateLimiter::in_memory(&RateLimitConfig { trust_proxy: true, ..RateLimitConfig::default() });
        assert_eq!(proxied.client_for(&headers, peer), "203.0.113.7");
    }
}
