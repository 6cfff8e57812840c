//! Fixed-window rate limiting keyed by session.
//!
//! # Algorithm
//! ```text
//! state = store[key]
//! if state exists and now - state.window_start < period:
//!     if state.count >= limit: reject (429)
//!     else: state.count += 1
//! else:
//!     state = {count: 1, window_start: now}
//! ```
//!
//! # Design Decisions
//! - Windows are fixed, not sliding
//! - Read-modify-write is serialised per key, so concurrent requests from one
//!   session cannot both pass on a stale count
//! - Rejected requests do not advance the counter
//! - State lives behind `SessionStore`, so it can outlive the process
//! - A key lock lives only while a check holds it
//! - Expired windows are swept at most once per period

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::observability::metrics;

/// Per-session counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateState {
    pub count: u32,
    pub window_start: SystemTime,
}

/// External session state. Calls may block.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateState>;
    fn put(&self, key: &str, state: RateState);

    /// Drop states whose window closed `period` or more before `now`.
    /// Stores with their own expiry can keep the default.
    fn evict_expired(&self, _now: SystemTime, _period: Duration) -> usize {
        0
    }
}

/// Session store held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    states: DashMap<String, RateState>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<RateState> {
        self.states.get(key).map(|r| *r.value())
    }

    fn put(&self, key: &str, state: RateState) {
        self.states.insert(key.to_string(), state);
    }

    fn evict_expired(&self, now: SystemTime, period: Duration) -> usize {
        let before = self.states.len();
        self.states.retain(|_, state| {
            now.duration_since(state.window_start)
                .map(|elapsed| elapsed < period)
                .unwrap_or(true)
        });
        before.saturating_sub(self.states.len())
    }
}

/// Result of a rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { count: u32 },
    Limited { retry_after: Duration },
}

/// Fixed-window limiter over a [`SessionStore`].
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn SessionStore>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    last_sweep: Arc<Mutex<SystemTime>>,
    limit: u32,
    period: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn SessionStore>, limit: u32, period: Duration) -> Self {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(SystemTime::UNIX_EPOCH)),
            limit,
            period,
        }
    }

    /// Same store and key locks, new policy. Used on config reload.
    pub fn with_policy(&self, limit: u32, period: Duration) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            last_sweep: Arc::clone(&self.last_sweep),
            limit,
            period,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn check(&self, key: &str, now: SystemTime) -> RateDecision {
        let lock = Arc::clone(&self.locks.entry(key.to_string()).or_default());
        let decision = {
            let _guard = lock.lock().expect("rate limiter mutex poisoned");
            self.check_locked(key, now)
        };
        drop(lock);
        // Clones are only taken under the shard lock, so a count of one means
        // no other check holds or is about to take this lock.
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);

        self.sweep(now);
        decision
    }

    /// Evict expired windows now. Returns how many were dropped.
    pub fn evict_expired(&self, now: SystemTime) -> usize {
        let evicted = self.store.evict_expired(now, self.period);
        if evicted > 0 {
            tracing::debug!(evicted, "Expired rate windows evicted");
        }
        evicted
    }

    fn sweep(&self, now: SystemTime) {
        {
            let mut last = self.last_sweep.lock().expect("rate limiter sweep mutex poisoned");
            match now.duration_since(*last) {
                Ok(elapsed) if elapsed >= self.period => *last = now,
                _ => return,
            }
        }
        self.evict_expired(now);
    }

    fn check_locked(&self, key: &str, now: SystemTime) -> RateDecision {
        match self.store.get(key) {
            Some(state) => {
                // A clock that moved backwards keeps the current window.
                let elapsed = now.duration_since(state.window_start).unwrap_or(Duration::ZERO);
                if elapsed < self.period {
                    if state.count >= self.limit {
                        tracing::warn!(session = %key, count = state.count, "Rate limit exceeded");
                        metrics::record_rate_limited();
                        return RateDecision::Limited {
                            retry_after: self.period - elapsed,
                        };
                    }
                    let count = state.count + 1;
                    self.store.put(key, RateState { count, ..state });
                    return RateDecision::Allowed { count };
                }
                self.reset(key, now)
            }
            None => self.reset(key, now),
        }
    }

    fn reset(&self, key: &str, now: SystemTime) -> RateDecision {
        self.store.put(
            key,
            RateState {
                count: 1,
                window_start: now,
            },
        );
        RateDecision::Allowed { count: 1 }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.limit)
            .field("period", &self.period)
            .finish()
    }
}
