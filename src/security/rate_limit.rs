//! Per-identity sliding-window rate limiting.
//!
//! The ledger maps an identity key to the timestamps of its recent requests.
//! Each check prunes timestamps older than the window, then either rejects or
//! appends `now`. The prune-count-append sequence runs under the entry's
//! shard lock, so concurrent requests for one identity cannot all pass on a
//! stale count, while unrelated identities rarely contend.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::auth::SessionContext;
use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Rejection carrying a conservative retry hint (the full window length).
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
pub struct RateLimited {
    pub retry_after_secs: u64,
}

/// Snapshot of the ledger for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStats {
    pub tracked_identities: usize,
    pub in_window_requests: usize,
    pub max_requests: usize,
    pub window_secs: u64,
}

/// Sliding-window limiter over an in-memory ledger.
#[derive(Debug)]
pub struct RateLimiter {
    ledger: DashMap<String, VecDeque<Instant>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            ledger: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_requests,
            Duration::from_secs(config.window_minutes.saturating_mul(60)),
        )
    }

    /// Record a request for `key` now, or reject it.
    pub fn check(&self, key: &str) -> Result<(), RateLimited> {
        self.check_at(key, Instant::now())
    }

    /// Record a request for `key` at `now`, or reject it.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimited> {
        let mut entry = self.ledger.entry(key.to_string()).or_default();
        prune(&mut entry, now, self.window);

        if entry.len() >= self.max_requests {
            metrics::record_rate_limited();
            return Err(RateLimited {
                retry_after_secs: self.window.as_secs(),
            });
        }

        entry.push_back(now);
        Ok(())
    }

    /// Evict identities with no in-window requests. Returns the number evicted.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.ledger.len();
        self.ledger.retain(|_, timestamps| {
            prune(timestamps, now, self.window);
            !timestamps.is_empty()
        });
        before.saturating_sub(self.ledger.len())
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            tracked_identities: self.ledger.len(),
            in_window_requests: self.ledger.iter().map(|e| e.value().len()).sum(),
            max_requests: self.max_requests,
            window_secs: self.window.as_secs(),
        }
    }
}

/// Drop timestamps that fell out of `[now - window, now]`.
fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = timestamps.front() {
        if now.saturating_duration_since(front) > window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Ledger key for a request.
///
/// Authenticated traffic is keyed by subject, anonymous traffic by peer IP;
/// the prefixes keep the two identity spaces apart.
pub fn identity_key(ctx: &SessionContext, peer: IpAddr) -> String {
    match ctx.subject() {
        Some(subject) => format!("sub:{}", subject),
        None => format!("ip:{}", peer),
    }
}
