#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory TTL cache with an injectable clock.
//!
//! Process-local, non-durable caching for derived pipeline data
//! (extracted footprints, imagery validation metadata). Expiry is lazy:
//! entries are dropped when a read finds them past their TTL, never by
//! a background sweeper. Entries are independent and writes are
//! idempotent overwrites, so the only locking is a per-cache mutex held
//! across individual map operations.
//!
//! The clock is injected via the [`Clock`] trait rather than read from
//! a global, so tests drive expiry deterministically with
//! [`ManualClock`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// A source of "now" for TTL decisions.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock for deterministic tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Advances the clock by `delta`.
    ///
    /// # Panics
    ///
    /// Panics if another holder of the internal lock panicked.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// A key -> (value, written-at) map whose entries expire `ttl` after
/// their write.
///
/// Reads return clones; the cache never hands out references into the
/// map. Last writer wins per key, which is acceptable because cached
/// values are derived data, not authoritative state.
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<BTreeMap<K, (V, DateTime<Utc>)>>,
}

impl<K: Ord + Clone, V: Clone> TtlCache<K, V> {
    /// Creates a cache whose entries live for `ttl` after each write.
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the live value for `key`, dropping it first if expired.
    ///
    /// # Panics
    ///
    /// Panics if another holder of the internal lock panicked.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();

        match entries.get(key) {
            Some((_, written_at)) if now - *written_at >= self.ttl => {
                entries.remove(key);
                log::trace!("cache entry expired");
                None
            }
            Some((value, _)) => Some(value.clone()),
            None => None,
        }
    }

    /// Stores `value` under `key`, stamping it with the clock's now.
    /// Overwrites any previous entry for the key.
    ///
    /// # Panics
    ///
    /// Panics if another holder of the internal lock panicked.
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        self.entries.lock().unwrap().insert(key, (value, now));
    }

    /// Number of entries currently stored, live or not (expired entries
    /// linger until a read touches them).
    ///
    /// # Panics
    ///
    /// Panics if another holder of the internal lock panicked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no entries at all.
    ///
    /// # Panics
    ///
    /// Panics if another holder of the internal lock panicked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Drops every entry.
    ///
    /// # Panics
    ///
    /// Panics if another holder of the internal lock panicked.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
