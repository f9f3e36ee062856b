//! Token bucket rate limiting for the search endpoint.
//!
//! One bucket per tracked identity (IP, session or user; the limiter only
//! sees an opaque key). Buckets are created lazily at full capacity, kept in
//! a bounded LRU index and purged once idle for longer than the TTL; the
//! purge sweep runs on every `purge_every`-th request. Each
//! bucket has its own lock, so identities never wait on each other beyond
//! the index lookup.

mod state;

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use state::RateLimitState;

/// The caller exhausted its tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Rate limit exceeded, retry after {retry_after_seconds}s")]
pub struct RateLimitExceeded {
    pub retry_after_seconds: u64,
}

/// How callers are identified. Chosen by configuration; the limiter itself
/// is keyed by whatever string it is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMethod {
    #[default]
    Ip,
    Session,
    User,
}

impl TrackingMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ip" => Some(Self::Ip),
            "session" => Some(Self::Session),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ip => "ip",
            Self::Session => "session",
            Self::User => "user",
        }
    }
}

impl fmt::Display for TrackingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Tokens a fresh bucket holds.
    pub capacity: u32,
    /// Extra tokens an idle bucket may accumulate above capacity.
    pub burst_size: u32,
    pub refill_rate_per_second: f64,
    pub tracking_method: TrackingMethod,
    /// Buckets idle longer than this are purged.
    pub idle_ttl: Duration,
    /// Upper bound on tracked identities; least recently used go first.
    pub max_identities: usize,
    /// Requests between idle sweeps. Zero disables sweeping.
    pub purge_every: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 60,
            burst_size: 10,
            refill_rate_per_second: 1.0,
            tracking_method: TrackingMethod::Ip,
            idle_ttl: Duration::from_secs(120),
            max_identities: 10_000,
            purge_every: 256,
        }
    }
}

/// Rate-limit status as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub enabled: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the bucket is back at capacity.
    pub reset: u64,
    pub burst_size: u32,
    pub tracking_method: TrackingMethod,
}

type Bucket = Arc<Mutex<RateLimitState>>;

/// Token bucket rate limiter keyed by identity.
pub struct TokenBucketRateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<LruCache<String, Bucket>>,
    requests: AtomicU64,
}

impl TokenBucketRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let bound = NonZeroUsize::new(config.max_identities).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            buckets: Mutex::new(LruCache::new(bound)),
            requests: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn consume(&self, identity: &str, cost: u32) -> Result<(), RateLimitExceeded> {
        self.consume_at(identity, cost, Instant::now())
    }

    /// Take `cost` tokens from `identity`'s bucket at time `now`.
    pub fn consume_at(
        &self,
        identity: &str,
        cost: u32,
        now: Instant,
    ) -> Result<(), RateLimitExceeded> {
        if !self.config.enabled {
            return Ok(());
        }

        let seen = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.purge_every > 0 && seen % self.config.purge_every == 0 {
            self.purge_idle_at(now);
        }

        let bucket = self.bucket(identity, now);
        let result = bucket.lock().try_consume(cost, now);
        if let Err(e) = &result {
            debug!(
                identity = %identity,
                retry_after_seconds = e.retry_after_seconds,
                "Rate limit exceeded"
            );
        }
        result
    }

    pub fn remaining(&self, identity: &str) -> u32 {
        self.remaining_at(identity, Instant::now())
    }

    /// Whole tokens available to `identity` at `now`. Does not create or
    /// refill the bucket.
    pub fn remaining_at(&self, identity: &str, now: Instant) -> u32 {
        match self.peek(identity) {
            Some(bucket) => bucket.lock().balance_at(now).floor() as u32,
            None => self.config.capacity,
        }
    }

    pub fn status(&self, identity: &str) -> RateLimitStatus {
        self.status_at(identity, Instant::now())
    }

    pub fn status_at(&self, identity: &str, now: Instant) -> RateLimitStatus {
        let reset = match self.peek(identity) {
            Some(bucket) => {
                let mut state = bucket.lock().clone();
                state.refill(now);
                state.seconds_until(f64::from(self.config.capacity))
            }
            None => 0,
        };

        RateLimitStatus {
            enabled: self.config.enabled,
            limit: self.config.capacity,
            remaining: self.remaining_at(identity, now),
            reset,
            burst_size: self.config.burst_size,
            tracking_method: self.config.tracking_method,
        }
    }

    /// Drop buckets idle for longer than the TTL. Returns how many went.
    ///
    /// A caller still holding a purged bucket finishes against it; the next
    /// request for that identity starts from a full bucket.
    pub fn purge_idle_at(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.lock();
        let idle: Vec<String> = buckets
            .iter()
            .filter(|(_, bucket)| {
                now.saturating_duration_since(bucket.lock().last_refill_at()) > self.config.idle_ttl
            })
            .map(|(identity, _)| identity.clone())
            .collect();

        for identity in &idle {
            buckets.pop(identity);
        }

        if !idle.is_empty() {
            debug!(purged = idle.len(), "Purged idle rate limit buckets");
        }
        idle.len()
    }

    pub fn purge_idle(&self) -> usize {
        self.purge_idle_at(Instant::now())
    }

    pub fn tracked_identities(&self) -> usize {
        self.buckets.lock().len()
    }

    fn peek(&self, identity: &str) -> Option<Bucket> {
        self.buckets.lock().peek(identity).cloned()
    }

    fn bucket(&self, identity: &str, now: Instant) -> Bucket {
        let mut buckets = self.buckets.lock();
        if let Some(bucket) = buckets.get(identity) {
            return bucket.clone();
        }

        let bucket = Arc::new(Mutex::new(RateLimitState::new(
            self.config.capacity,
            self.config.burst_size,
            self.config.refill_rate_per_second,
            now,
        )));
        buckets.put(identity.to_string(), bucket.clone());
        bucket
    }
}
