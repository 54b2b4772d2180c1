//! Fixed-window request counters.
//!
//! Windows are aligned to the epoch: a tier of 60 000 ms counts requests in
//! `[k * 60000, (k + 1) * 60000)`. Once a key exceeds its limit it stays
//! limited until the window rolls over.
//!
//! Counters of ended windows are dropped every [`DEFAULT_PRUNE_INTERVAL`]
//! evaluations, so keys that stop sending requests do not accumulate.

use std::sync::atomic::{AtomicU64, Ordering};

use bastion_core::RateLimitTier;
use chrono::Utc;
use dashmap::DashMap;

/// Outcome of one counted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Requests counted for the key in the current window, this one included.
    pub count: u64,
    pub limited: bool,
    pub window_start_ms: u64,
}

#[derive(Debug, Clone)]
struct WindowCounter {
    window_start_ms: u64,
    count: u64,
    limited: bool,
}

impl WindowCounter {
    fn new(window_start_ms: u64) -> Self {
        Self {
            window_start_ms,
            count: 0,
            limited: false,
        }
    }
}

pub const DEFAULT_PRUNE_INTERVAL: u64 = 1024;

/// Per-key, per-tier counters shared by all requests.
#[derive(Debug)]
pub struct RateLimiter {
    counters: DashMap<(String, RateLimitTier), WindowCounter>,
    evaluations: AtomicU64,
    prune_interval: u64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_prune_interval(DEFAULT_PRUNE_INTERVAL)
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A limiter that drops expired counters every `interval` evaluations.
    pub fn with_prune_interval(interval: u64) -> Self {
        Self {
            counters: DashMap::new(),
            evaluations: AtomicU64::new(0),
            prune_interval: interval.max(1),
        }
    }

    /// Count a request for `key` against `tier` at the current time.
    pub fn evaluate(&self, key: &str, tier: RateLimitTier) -> RateLimitStatus {
        self.evaluate_at(key, tier, now_ms())
    }

    /// Count a request for `key` against `tier` at `now_ms`.
    ///
    /// The increment, the comparison and the sticky flag update happen while
    /// holding the entry lock, so concurrent callers never lose an update.
    pub fn evaluate_at(&self, key: &str, tier: RateLimitTier, now_ms: u64) -> RateLimitStatus {
        let status = self.count(key, tier, now_ms);

        // The entry lock is released here; pruning locks every shard
        let evaluations = self.evaluations.fetch_add(1, Ordering::Relaxed) + 1;
        if evaluations % self.prune_interval == 0 {
            let removed = self.prune_expired_at(now_ms);
            if removed > 0 {
                tracing::debug!(
                    removed,
                    remaining = self.counters.len(),
                    "Pruned expired rate-limit counters"
                );
            }
        }
        status
    }

    fn count(&self, key: &str, tier: RateLimitTier, now_ms: u64) -> RateLimitStatus {
        let window_start_ms = window_start(now_ms, tier.window_ms);
        let mut entry = self
            .counters
            .entry((key.to_string(), tier))
            .or_insert_with(|| WindowCounter::new(window_start_ms));
        let counter = entry.value_mut();

        // A request stamped before the current window (clock skew) is
        // counted in the current one
        if window_start_ms > counter.window_start_ms {
            *counter = WindowCounter::new(window_start_ms);
        }
        counter.count = counter.count.saturating_add(1);
        if counter.count > tier.max_requests {
            counter.limited = true;
        }

        RateLimitStatus {
            count: counter.count,
            limited: counter.limited,
            window_start_ms: counter.window_start_ms,
        }
    }

    /// Current state of a key without counting a request.
    pub fn peek_at(&self, key: &str, tier: RateLimitTier, now_ms: u64) -> Option<RateLimitStatus> {
        let window_start_ms = window_start(now_ms, tier.window_ms);
        let counter = self.counters.get(&(key.to_string(), tier))?;
        if counter.window_start_ms < window_start_ms {
            return None;
        }
        Some(RateLimitStatus {
            count: counter.count,
            limited: counter.limited,
            window_start_ms: counter.window_start_ms,
        })
    }

    /// Drop counters whose window has ended. Returns how many were removed.
    pub fn prune_expired_at(&self, now_ms: u64) -> usize {
        let before = self.counters.len();
        self.counters.retain(|(_, tier), counter| {
            counter.window_start_ms >= window_start(now_ms, tier.window_ms)
        });
        before.saturating_sub(self.counters.len())
    }

    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(now_ms())
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn clear(&self) {
        self.counters.clear();
    }
}

fn window_start(now_ms: u64, window_ms: u64) -> u64 {
    let window_ms = window_ms.max(1);
    now_ms - now_ms % window_ms
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
