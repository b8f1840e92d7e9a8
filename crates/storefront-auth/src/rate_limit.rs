//! Token-bucket admission control.
//!
//! Every request is charged one token from the bucket keyed by
//! `(client identity, "METHOD:path")`. Each bucket holds up to `capacity`
//! tokens and refills continuously at `capacity` tokens per minute, so a
//! client may burst up to the full budget and then proceeds at the
//! sustained rate.
//!
//! The capacity of a bucket comes from the first configured endpoint prefix
//! that matches `METHOD:path`, or the default rate when none match.
//!
//! Buckets are created lazily and evicted by [`RateLimiter::sweep_idle`] once
//! they have been idle for a configurable number of refill windows. The map
//! never holds more than `max_buckets` entries. When it is full, a throttled
//! inline sweep runs, and requests for keys that still do not fit are charged
//! against a shared overflow bucket for their endpoint limit.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;

use crate::config::{EndpointLimit, RateLimitingConfig};

/// Length of one refill window.
pub const REFILL_WINDOW: Duration = Duration::from_secs(60);

/// Minimum spacing between two inline sweeps triggered by a full map.
const INLINE_SWEEP_SPACING: Duration = REFILL_WINDOW;

/// Bucket identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    /// Client network identity (best-effort IP).
    pub client: String,
    /// `METHOD:path` of the request.
    pub endpoint: String,
}

impl BucketKey {
    /// Builds a key from client identity, method and path.
    #[must_use]
    pub fn new(client: impl Into<String>, method: &str, path: &str) -> Self {
        Self {
            client: client.into(),
            endpoint: format!("{method}:{path}"),
        }
    }
}

/// Outcome of charging a request against its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allowed {
        /// Whole tokens left after this request.
        remaining: u32,
    },
    /// The bucket is empty.
    Rejected {
        /// Time until one token becomes available.
        retry_after: Duration,
    },
}

impl Decision {
    /// Returns `true` if the request was admitted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Whole tokens left; `0` for a rejection.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        match self {
            Self::Allowed { remaining } => *remaining,
            Self::Rejected { .. } => 0,
        }
    }
}

/// A single token bucket with greedy continuous refill.
#[derive(Debug)]
struct TokenBucket {
    capacity: u32,
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, now: Instant) -> Self {
        Self {
            capacity,
            tokens: f64::from(capacity),
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill_rate_per_sec(&self) -> f64 {
        f64::from(self.capacity) / REFILL_WINDOW.as_secs_f64()
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed.is_zero() {
            return;
        }
        let refilled = self.tokens + elapsed.as_secs_f64() * self.refill_rate_per_sec();
        self.tokens = refilled.min(f64::from(self.capacity));
        self.last_refill = now;
    }

    fn try_consume(&mut self, now: Instant) -> Decision {
        self.refill(now);
        if now > self.last_seen {
            self.last_seen = now;
        }

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Decision::Allowed {
                remaining: self.tokens.floor() as u32,
            }
        } else {
            let missing = 1.0 - self.tokens;
            Decision::Rejected {
                retry_after: Duration::from_secs_f64(missing / self.refill_rate_per_sec()),
            }
        }
    }
}

/// Process-wide map of token buckets.
///
/// Construct once at startup and share through application state.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<BucketKey, Mutex<TokenBucket>>,
    /// Reserved bucket slots; always `>= buckets.len()`.
    slots: AtomicUsize,
    /// One shared bucket per endpoint limit, plus one for the default rate.
    overflow: Vec<Mutex<TokenBucket>>,
    last_inline_sweep: Mutex<Option<Instant>>,
    default_capacity: u32,
    endpoints: Vec<EndpointLimit>,
    idle_ttl: Duration,
    max_buckets: usize,
}

impl RateLimiter {
    /// Creates a limiter from configuration.
    #[must_use]
    pub fn from_config(config: &RateLimitingConfig) -> Self {
        let default_capacity = config.default_requests_per_minute.max(1);
        let created = Instant::now();
        let overflow = config
            .endpoints
            .iter()
            .map(|limit| limit.requests_per_minute.max(1))
            .chain(std::iter::once(default_capacity))
            .map(|capacity| Mutex::new(TokenBucket::new(capacity, created)))
            .collect();

        Self {
            buckets: DashMap::new(),
            slots: AtomicUsize::new(0),
            overflow,
            last_inline_sweep: Mutex::new(None),
            default_capacity,
            endpoints: config.endpoints.clone(),
            idle_ttl: REFILL_WINDOW * config.idle_eviction_windows.max(1),
            max_buckets: config.max_buckets.max(1),
        }
    }

    /// Bucket capacity for a `METHOD:path` endpoint key.
    #[must_use]
    pub fn capacity_for(&self, endpoint: &str) -> u32 {
        self.capacity_of(self.limit_index(endpoint))
    }

    /// Position of the first endpoint limit matching `endpoint`.
    fn limit_index(&self, endpoint: &str) -> Option<usize> {
        self.endpoints
            .iter()
            .position(|limit| endpoint.starts_with(&limit.prefix))
    }

    fn capacity_of(&self, index: Option<usize>) -> u32 {
        index
            .and_then(|i| self.endpoints.get(i))
            .map(|limit| limit.requests_per_minute.max(1))
            .unwrap_or(self.default_capacity)
    }

    /// Charges one request against its bucket at the current instant.
    pub fn try_consume(&self, key: BucketKey) -> Decision {
        self.try_consume_at(key, Instant::now())
    }

    /// Charges one request against its bucket at `now`.
    pub fn try_consume_at(&self, key: BucketKey, now: Instant) -> Decision {
        if let Some(bucket) = self.buckets.get(&key) {
            return bucket.lock().try_consume(now);
        }

        let index = self.limit_index(&key.endpoint);
        if !self.reserve_slot() && !(self.sweep_if_due(now) && self.reserve_slot()) {
            tracing::debug!(
                client = %key.client,
                endpoint = %key.endpoint,
                "Bucket map full, charging overflow bucket"
            );
            return self.consume_overflow(index, now);
        }

        let capacity = self.capacity_of(index);
        match self.buckets.entry(key) {
            Entry::Occupied(entry) => {
                self.release_slots(1);
                entry.get().lock().try_consume(now)
            }
            Entry::Vacant(entry) => entry
                .insert(Mutex::new(TokenBucket::new(capacity, now)))
                .lock()
                .try_consume(now),
        }
    }

    /// Evicts buckets idle for longer than the configured number of windows.
    ///
    /// Returns the number of buckets removed.
    pub fn sweep_idle(&self, now: Instant) -> usize {
        let idle_ttl = self.idle_ttl;
        let mut removed = 0;
        self.buckets.retain(|_, bucket| {
            let keep = now.saturating_duration_since(bucket.lock().last_seen) <= idle_ttl;
            if !keep {
                removed += 1;
            }
            keep
        });
        self.release_slots(removed);
        removed
    }

    /// Claims room for one more bucket. Fails when the map is full.
    fn reserve_slot(&self) -> bool {
        self.slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.max_buckets).then_some(used + 1)
            })
            .is_ok()
    }

    fn release_slots(&self, count: usize) {
        if count > 0 {
            self.slots.fetch_sub(count, Ordering::AcqRel);
        }
    }

    /// Runs an inline sweep unless one ran within the last window or is
    /// already running. Returns `true` if buckets were evicted.
    fn sweep_if_due(&self, now: Instant) -> bool {
        let Some(mut last) = self.last_inline_sweep.try_lock() else {
            return false;
        };
        if last.is_some_and(|at| now.saturating_duration_since(at) < INLINE_SWEEP_SPACING) {
            return false;
        }
        *last = Some(now);
        drop(last);

        let evicted = self.sweep_idle(now);
        if evicted == 0 {
            tracing::warn!(
                max_buckets = self.max_buckets,
                "Rate limiter bucket map at capacity"
            );
        }
        evicted > 0
    }

    fn consume_overflow(&self, index: Option<usize>, now: Instant) -> Decision {
        let slot = index.unwrap_or(self.endpoints.len());
        match self.overflow.get(slot) {
            Some(bucket) => bucket.lock().try_consume(now),
            None => Decision::Rejected {
                retry_after: REFILL_WINDOW,
            },
        }
    }

    /// Number of live buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if no buckets exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Starts the background idle-bucket sweep.
    pub fn start_sweep_task(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);

            loop {
                interval.tick().await;

                let evicted = self.sweep_idle(Instant::now());
                if evicted > 0 {
                    tracing::debug!(evicted, live = self.len(), "Idle rate limit buckets evicted");
                }
            }
        })
    }
}
