//! In-memory sliding-window rate limiting
//!
//! - Lead form: 5 submissions per IP per 10 minutes
//! - Login: 5 failed attempts per username per 15 minutes, 10 requests per IP
//!   per minute

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sliding-window counter keyed by string
#[derive(Clone)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Limiter for the public lead form
    pub fn for_leads() -> Self {
        Self::new(5, Duration::minutes(10))
    }

    /// Whether `key` has used up its allowance
    pub async fn is_limited(&self, key: &str) -> bool {
        let mut hits = self.hits.write().await;
        let cutoff = Utc::now() - self.window;

        let times = hits.entry(key.to_string()).or_default();
        times.retain(|time| *time > cutoff);
        times.len() >= self.limit
    }

    pub async fn record(&self, key: &str) {
        let mut hits = self.hits.write().await;
        hits.entry(key.to_string()).or_default().push(Utc::now());
    }

    /// Record a hit unless `key` is already limited.
    ///
    /// Returns `false` when the hit was refused.
    pub async fn try_acquire(&self, key: &str) -> bool {
        let mut hits = self.hits.write().await;
        let now = Utc::now();
        let cutoff = now - self.window;

        let times = hits.entry(key.to_string()).or_default();
        times.retain(|time| *time > cutoff);
        if times.len() >= self.limit {
            return false;
        }
        times.push(now);
        true
    }

    pub async fn clear(&self, key: &str) {
        self.hits.write().await.remove(key);
    }

    /// Drop expired entries; run periodically
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        let mut hits = self.hits.write().await;
        hits.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }
}

/// Login throttling by username and by client IP
#[derive(Clone)]
pub struct LoginRateLimiter {
    usernames: RateLimiter,
    ips: RateLimiter,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            usernames: RateLimiter::new(5, Duration::minutes(15)),
            ips: RateLimiter::new(10, Duration::minutes(1)),
        }
    }

    pub async fn is_username_limited(&self, username: &str) -> bool {
        self.usernames.is_limited(&username.to_lowercase()).await
    }

    pub async fn record_failed_attempt(&self, username: &str) {
        self.usernames.record(&username.to_lowercase()).await;
    }

    /// Forget failures after a successful login
    pub async fn clear_username_attempts(&self, username: &str) {
        self.usernames.clear(&username.to_lowercase()).await;
    }

    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        self.ips.is_limited(&ip.to_string()).await
    }

    pub async fn record_ip_request(&self, ip: IpAddr) {
        self.ips.record(&ip.to_string()).await;
    }

    pub async fn cleanup(&self) {
        self.usernames.cleanup().await;
        self.ips.cleanup().await;
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
