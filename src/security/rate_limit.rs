//! Fixed-window rate limiting.
//!
//! Each key gets `requests` hits per `window`. The first hit opens a window;
//! once `window_start + window` has passed, the next hit opens a fresh one.
//! Every check is both a read and a write.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Limits applied to every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    fn window_ms(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitVerdict {
    pub allowed: bool,
    pub remaining: u32,
    /// Epoch milliseconds at which the active window ends.
    pub reset_at_ms: u64,
}

/// Counter for one key.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    window_start_ms: u64,
}

/// Storage for window records.
///
/// `hit` must perform the check and the increment atomically for a key.
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key` at `now_ms` and return the verdict.
    fn hit(&self, key: &str, policy: &RateLimitPolicy, now_ms: u64) -> RateLimitVerdict;

    /// Drop records whose window ended before `now_ms`. Returns how many were removed.
    fn prune(&self, policy: &RateLimitPolicy, now_ms: u64) -> usize;

    /// Number of tracked keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store. The shard lock held by `entry` makes each hit atomic.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, WindowRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for MemoryStore {
    fn hit(&self, key: &str, policy: &RateLimitPolicy, now_ms: u64) -> RateLimitVerdict {
        let window_ms = policy.window_ms();
        let mut record = self
            .records
            .entry(key.to_string())
            .or_insert(WindowRecord {
                count: 0,
                window_start_ms: now_ms,
            });

        let expired = now_ms > record.window_start_ms.saturating_add(window_ms);
        if record.count == 0 || expired {
            record.count = 1;
            record.window_start_ms = now_ms;
            return RateLimitVerdict {
                allowed: true,
                remaining: policy.requests.saturating_sub(1),
                reset_at_ms: now_ms.saturating_add(window_ms),
            };
        }

        record.count = record.count.saturating_add(1);
        let reset_at_ms = record.window_start_ms.saturating_add(window_ms);
        if record.count <= policy.requests {
            RateLimitVerdict {
                allowed: true,
                remaining: policy.requests - record.count,
                reset_at_ms,
            }
        } else {
            RateLimitVerdict {
                allowed: false,
                remaining: 0,
                reset_at_ms,
            }
        }
    }

    fn prune(&self, policy: &RateLimitPolicy, now_ms: u64) -> usize {
        let window_ms = policy.window_ms();
        let before = self.records.len();
        self.records
            .retain(|_, record| now_ms <= record.window_start_ms.saturating_add(window_ms));
        before.saturating_sub(self.records.len())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Namespaced limiter over a shared store.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
    namespace: String,
}

impl RateLimiter {
    /// Limiter with an in-memory store.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_store(
            Arc::new(MemoryStore::new()),
            RateLimitPolicy {
                requests: config.requests,
                window: Duration::from_millis(config.window_ms),
            },
            config.namespace.clone(),
        )
    }

    pub fn with_store(
        store: Arc<dyn RateLimitStore>,
        policy: RateLimitPolicy,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            policy,
            namespace: namespace.into(),
        }
    }

    /// Check `client` against the wall clock.
    pub fn check(&self, client: &str) -> RateLimitVerdict {
        self.check_at(client, now_ms())
    }

    /// Check `client` at an explicit time.
    pub fn check_at(&self, client: &str, now_ms: u64) -> RateLimitVerdict {
        self.store.hit(&self.key_for(client), &self.policy, now_ms)
    }

    /// Store key for a client: `"<namespace>:<client>"`.
    pub fn key_for(&self, client: &str) -> String {
        format!("{}:{}", self.namespace, client)
    }

    /// Remove expired records.
    pub fn prune(&self) -> usize {
        self.store.prune(&self.policy, now_ms())
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Seconds a rejected client should wait, rounded up.
    pub fn retry_after_secs(&self) -> u64 {
        self.policy.window_ms().div_ceil(1000)
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(requests: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::with_store(
            Arc::new(MemoryStore::new()),
            RateLimitPolicy {
                requests,
                window: Duration::from_millis(window_ms),
            },
            "proxygrid",
        )
    }

    #[test]
    fn test_fixed_window_sequence() {
        let limiter = limiter(3, 1000);

        let verdicts: Vec<_> = [0, 10, 20, 30]
            .iter()
            .map(|t| limiter.check_at("1.2.3.4", *t))
            .collect();

        let allowed: Vec<_> = verdicts.iter().map(|v| v.allowed).collect();
        let remaining: Vec<_> = verdicts.iter().map(|v| v.remaining).collect();
        assert_eq!(allowed, vec![true, true, true, false]);
        assert_eq!(remaining, vec![2, 1, 0, 0]);
        assert!(verdicts.iter().all(|v| v.reset_at_ms == 1000));
    }

    #[test]
    fn test_window_reset() {
        let limiter = limiter(3, 1000);
        for t in 0..5 {
            limiter.check_at("client", t);
        }
        assert!(!limiter.check_at("client", 1000).allowed);

        let fresh = limiter.check_at("client", 1001);
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 2);
        assert_eq!(fresh.reset_at_ms, 2001);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(1, 1000);
        assert!(limiter.check_at("a", 0).allowed);
        assert!(!limiter.check_at("a", 1).allowed);
        assert!(limiter.check_at("b", 1).allowed);
        assert_eq!(limiter.key_for("a"), "proxygrid:a");
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_prune_drops_expired_records() {
        let store = MemoryStore::new();
        let policy = RateLimitPolicy {
            requests: 10,
            window: Duration::from_millis(100),
        };
        store.hit("old", &policy, 0);
        store.hit("new", &policy, 150);

        assert_eq!(store.prune(&policy, 200), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_hits_do_not_overrun() {
        let limiter = Arc::new(limiter(500, 60_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..250)
                        .filter(|_| limiter.check_at("shared", 5).allowed)
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 500);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(limiter(1, 60_000).retry_after_secs(), 60);
        assert_eq!(limiter(1, 1500).retry_after_secs(), 2);
    }
}
