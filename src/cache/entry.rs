//! Cache Entry Module
//!
//! Defines a stored value together with its last-touch timestamp.

use std::sync::atomic::{AtomicU64, Ordering};

// == Cache Entry ==
/// A single live entry in a `CacheMap`.
///
/// `last_touch` is atomic so a read can refresh it while holding only shared
/// access to the map.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    value: V,
    /// Last read or write, in nanoseconds on the owning map's clock
    last_touch: AtomicU64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry touched at `now`.
    pub fn new(value: V, now: u64) -> Self {
        Self {
            value,
            last_touch: AtomicU64::new(now),
        }
    }

    /// Returns the stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry, returning the stored value.
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns the last read or write time in clock nanoseconds.
    pub fn last_touch(&self) -> u64 {
        self.last_touch.load(Ordering::Acquire)
    }

    // == Touch ==
    /// Refreshes the timestamp to `now`.
    ///
    /// Racing touches resolve to the latest time; the timestamp never moves
    /// backward.
    pub fn touch(&self, now: u64) {
        self.last_touch.fetch_max(now, Ordering::AcqRel);
    }

    // == Is Expired ==
    /// Returns true once the idle time is strictly greater than `ttl_nanos`.
    ///
    /// An entry idle for exactly the TTL is still fresh.
    pub fn is_expired(&self, now: u64, ttl_nanos: u64) -> bool {
        now.saturating_sub(self.last_touch()) > ttl_nanos
    }
}
