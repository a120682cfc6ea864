//! Cache Map Module
//!
//! Main map engine: HashMap storage with idle-time tracking and sweeps that
//! piggyback on inserts once the map grows past its size threshold.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::cache::clock::duration_to_nanos;
use crate::cache::{CacheEntry, Clock, Concurrent, Local, LockMode, MonotonicClock};
use crate::config::{CacheMapConfig, TouchPolicy};
use crate::verbs::LoadOrStore;

// == Map State ==
/// Everything guarded by the map's lock.
struct MapState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    size_threshold: usize,
    ttl: Duration,
    ttl_nanos: u64,
    touch_policy: TouchPolicy,
    clock: Arc<dyn Clock>,
}

impl<K, V> MapState<K, V>
where
    K: Eq + Hash + Clone,
{
    fn now(&self) -> u64 {
        self.clock.now_nanos()
    }

    fn sweep_if_over_threshold(&mut self, now: u64) -> Vec<K> {
        if self.entries.len() > self.size_threshold {
            self.sweep(now)
        } else {
            Vec::new()
        }
    }

    // == Sweep ==
    /// Removes every entry idle for longer than the TTL, returning its key.
    fn sweep(&mut self, now: u64) -> Vec<K> {
        let ttl_nanos = self.ttl_nanos;
        let mut cleared = Vec::new();

        self.entries.retain(|key, entry| {
            if entry.is_expired(now, ttl_nanos) {
                cleared.push(key.clone());
                false
            } else {
                true
            }
        });

        if cleared.is_empty() {
            trace!("Sweep: no expired entries among {}", self.entries.len());
        } else {
            debug!(
                "Sweep: removed {} expired entries, {} remaining",
                cleared.len(),
                self.entries.len()
            );
        }
        cleared
    }
}

// == Cache Map ==
/// Key-value map with idle-time expiry and size-triggered sweeps.
///
/// Cloning the map clones the handle: every clone sees the same entries.
/// `L` selects the access discipline, see [`Concurrent`] and [`Local`].
pub struct CacheMap<K, V, L: LockMode = Concurrent> {
    inner: L::Handle<MapState<K, V>>,
}

/// A `CacheMap` for single-threaded use, with no locking.
pub type LocalCacheMap<K, V> = CacheMap<K, V, Local>;

impl<K, V, L> CacheMap<K, V, L>
where
    K: Eq + Hash + Clone,
    V: Clone,
    L: LockMode,
{
    // == Constructors ==
    /// Creates a map with the given sweep threshold and TTL.
    pub fn new(size_threshold: usize, ttl: Duration) -> Self {
        Self::with_config(CacheMapConfig::new(size_threshold, ttl))
    }

    /// Creates a map from a full config, using the monotonic clock.
    pub fn with_config(config: CacheMapConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }

    /// Lets `init` adjust the config before storage is allocated.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use ttl_maps::{CacheMap, CacheMapConfig};
    ///
    /// let map: CacheMap<u32, String> = CacheMap::with_init(CacheMapConfig::default(), |cfg| {
    ///     cfg.initial_capacity = 64;
    ///     cfg.ttl = Duration::from_secs(30);
    /// });
    /// assert_eq!(map.ttl(), Duration::from_secs(30));
    /// ```
    pub fn with_init(mut config: CacheMapConfig, init: impl FnOnce(&mut CacheMapConfig)) -> Self {
        init(&mut config);
        Self::with_config(config)
    }

    /// Creates a map that stamps and ages entries with `clock`.
    ///
    /// A capacity that cannot be reserved is skipped; the map still builds
    /// and grows on demand.
    pub fn with_clock(config: CacheMapConfig, clock: impl Clock + 'static) -> Self {
        let mut entries = HashMap::new();
        if let Err(err) = entries.try_reserve(config.initial_capacity) {
            debug!(
                "Skipping initial capacity of {} entries: {}",
                config.initial_capacity, err
            );
        }

        let state = MapState {
            entries,
            size_threshold: config.size_threshold,
            ttl: config.ttl,
            ttl_nanos: duration_to_nanos(config.ttl),
            touch_policy: config.touch_policy,
            clock: Arc::new(clock),
        };
        Self {
            inner: L::wrap(state),
        }
    }

    // == Load ==
    /// Returns a copy of the value for `key`, refreshing its timestamp when
    /// the touch policy allows.
    pub fn load<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read(|state| {
            let entry = state.entries.get(key)?;
            if state.touch_policy.touches_on_read() {
                entry.touch(state.now());
            }
            Some(entry.value().clone())
        })
    }

    // == Store ==
    /// Inserts or replaces the value for `key` with a fresh timestamp.
    ///
    /// If the map then holds more than `size_threshold` entries, expired
    /// entries are swept and their keys returned.
    pub fn store(&self, key: K, value: V) -> Vec<K> {
        self.write(|state| {
            let now = state.now();
            state.entries.insert(key, CacheEntry::new(value, now));
            state.sweep_if_over_threshold(now)
        })
    }

    // == Load Or Store ==
    /// Returns the existing value for `key`, or inserts `value`.
    ///
    /// Presence is re-checked under exclusive access before inserting, so
    /// among racing callers exactly one observes `loaded == false`. Only the
    /// insert path can trigger a sweep.
    pub fn load_or_store(&self, key: K, value: V) -> LoadOrStore<K, V> {
        if let Some(actual) = self.load(&key) {
            return LoadOrStore {
                actual,
                loaded: true,
                cleared: Vec::new(),
            };
        }

        self.write(|state| {
            let now = state.now();
            if let Some(entry) = state.entries.get(&key) {
                if state.touch_policy.touches_on_read() {
                    entry.touch(now);
                }
                return LoadOrStore {
                    actual: entry.value().clone(),
                    loaded: true,
                    cleared: Vec::new(),
                };
            }

            state.entries.insert(key, CacheEntry::new(value.clone(), now));
            LoadOrStore {
                actual: value,
                loaded: false,
                cleared: state.sweep_if_over_threshold(now),
            }
        })
    }

    // == Load And Delete ==
    /// Removes `key` and returns its value if it was present.
    pub fn load_and_delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.write(|state| {
            state.entries.remove(key).map(CacheEntry::into_value)
        })
    }

    // == Delete ==
    /// Removes `key`; a missing key is a no-op.
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.write(|state| {
            state.entries.remove(key);
        });
    }

    // == Range ==
    /// Visits a point-in-time snapshot of the entries in unspecified order,
    /// stopping as soon as `visit` returns false.
    ///
    /// No lock is held while `visit` runs, so it may call back into the map.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for (key, value) in self.snapshot() {
            if !visit(&key, &value) {
                break;
            }
        }
    }

    /// Copies every key and value out under shared access. Does not touch.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.read(|state| {
            state
                .entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.value().clone()))
                .collect()
        })
    }

    // == Purge Expired ==
    /// Runs a sweep now, whatever the current size, and returns the cleared
    /// keys.
    pub fn purge_expired(&self) -> Vec<K> {
        self.write(|state| {
            let now = state.now();
            state.sweep(now)
        })
    }

    /// Returns true if `key` is present. Does not touch the entry.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read(|state| state.entries.contains_key(key))
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.write(|state| state.entries.clear());
    }
}

impl<K, V, L: LockMode> CacheMap<K, V, L> {
    fn read<R>(&self, f: impl FnOnce(&MapState<K, V>) -> R) -> R {
        L::read::<MapState<K, V>, R, _>(&self.inner, f)
    }

    fn write<R>(&self, f: impl FnOnce(&mut MapState<K, V>) -> R) -> R {
        L::write::<MapState<K, V>, R, _>(&self.inner, f)
    }

    /// Returns the number of live entries, including stale ones not yet swept.
    pub fn len(&self) -> usize {
        self.read(|state| state.entries.len())
    }

    /// Returns true if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the size above which an insert triggers a sweep.
    pub fn size_threshold(&self) -> usize {
        self.read(|state| state.size_threshold)
    }

    /// Returns the idle time after which an entry may be swept.
    pub fn ttl(&self) -> Duration {
        self.read(|state| state.ttl)
    }

    /// Returns the policy deciding which verbs refresh timestamps.
    pub fn touch_policy(&self) -> TouchPolicy {
        self.read(|state| state.touch_policy)
    }

    /// Returns true if this map enforces shared/exclusive access.
    pub fn is_concurrent(&self) -> bool {
        L::CONCURRENT
    }
}

impl<K, V, L: LockMode> Clone for CacheMap<K, V, L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V, L: LockMode> fmt::Debug for CacheMap<K, V, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheMap")
            .field("concurrent", &L::CONCURRENT)
            .field("len", &self.len())
            .field("size_threshold", &self.size_threshold())
            .field("ttl", &self.ttl())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use std::collections::HashSet;

    const TTL: Duration = Duration::from_millis(10);

    fn manual_map(size_threshold: usize) -> (CacheMap<&'static str, i32>, ManualClock) {
        let clock = ManualClock::new();
        let map = CacheMap::with_clock(CacheMapConfig::new(size_threshold, TTL), clock.clone());
        (map, clock)
    }

    #[test]
    fn test_map_new() {
        let map: CacheMap<String, String> = CacheMap::new(100, Duration::from_secs(300));
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert!(map.is_concurrent());
        assert_eq!(map.size_threshold(), 100);
    }

    #[test]
    fn test_store_and_load() {
        let (map, _) = manual_map(100);

        assert!(map.store("key1", 1).is_empty());
        assert_eq!(map.load("key1"), Some(1));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_load_nonexistent() {
        let (map, _) = manual_map(100);
        assert_eq!(map.load("nonexistent"), None);
    }

    #[test]
    fn test_load_with_borrowed_key() {
        let map: CacheMap<String, i32> = CacheMap::new(100, TTL);
        map.store("owned".to_string(), 5);
        assert_eq!(map.load("owned"), Some(5));
        assert!(map.contains_key("owned"));
    }

    #[test]
    fn test_overwrite() {
        let (map, _) = manual_map(100);

        map.store("key1", 1);
        map.store("key1", 2);

        assert_eq!(map.load("key1"), Some(2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_delete() {
        let (map, _) = manual_map(100);

        map.store("key1", 1);
        map.delete("key1");

        assert!(map.is_empty());
        assert_eq!(map.load("key1"), None);
    }

    #[test]
    fn test_delete_nonexistent_is_noop() {
        let (map, _) = manual_map(100);
        map.store("key1", 1);

        map.delete("missing");
        map.delete("missing");

        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_load_and_delete() {
        let (map, _) = manual_map(100);
        map.store("key1", 7);

        assert_eq!(map.load_and_delete("key1"), Some(7));
        assert_eq!(map.load_and_delete("key1"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_load_or_store_inserts_then_loads() {
        let (map, _) = manual_map(100);

        let first = map.load_or_store("key1", 1);
        assert_eq!(first.actual, 1);
        assert!(!first.loaded);
        assert!(first.cleared.is_empty());

        let second = map.load_or_store("key1", 2);
        assert_eq!(second.actual, 1);
        assert!(second.loaded);
        assert_eq!(map.load("key1"), Some(1));
    }

    #[test]
    fn test_sample_scenario() {
        let (map, clock) = manual_map(2);

        assert!(map.store("a", 1).is_empty());
        clock.advance(Duration::from_millis(1));
        assert!(map.store("b", 2).is_empty(), "size == threshold does not sweep");

        clock.advance(Duration::from_millis(15));
        let cleared: HashSet<_> = map.store("c", 3).into_iter().collect();

        assert_eq!(cleared, HashSet::from(["a", "b"]));
        assert_eq!(map.load("c"), Some(3));
        assert_eq!(map.load("a"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_threshold_not_crossed_never_sweeps() {
        let (map, clock) = manual_map(3);

        for key in ["a", "b", "c"] {
            clock.advance(Duration::from_millis(50));
            assert!(map.store(key, 0).is_empty());
        }
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_sweep_keeps_entry_idle_exactly_ttl() {
        let (map, clock) = manual_map(1);

        map.store("a", 1);
        clock.advance(TTL);
        let cleared = map.store("b", 2);

        assert!(cleared.is_empty());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_load_refreshes_timestamp() {
        let (map, clock) = manual_map(1);

        map.store("a", 1);
        clock.advance(Duration::from_millis(8));
        assert_eq!(map.load("a"), Some(1));
        clock.advance(Duration::from_millis(8));

        assert!(map.store("b", 2).is_empty(), "a was read 8ms ago");
        assert_eq!(map.load("a"), Some(1));
    }

    #[test]
    fn test_write_only_policy_ignores_reads() {
        let clock = ManualClock::new();
        let config = CacheMapConfig::new(1, TTL).with_touch_policy(TouchPolicy::OnWriteOnly);
        let map: CacheMap<&str, i32> = CacheMap::with_clock(config, clock.clone());

        map.store("a", 1);
        clock.advance(Duration::from_millis(8));
        map.load("a");
        clock.advance(Duration::from_millis(8));

        assert_eq!(map.store("b", 2), vec!["a"]);
    }

    #[test]
    fn test_load_or_store_sweeps_on_insert_only() {
        let (map, clock) = manual_map(1);

        map.store("a", 1);
        map.load_or_store("a", 9);
        clock.advance(Duration::from_millis(20));

        let hit = map.load_or_store("a", 9);
        assert!(hit.loaded);
        assert!(hit.cleared.is_empty());

        clock.advance(Duration::from_millis(20));
        let miss = map.load_or_store("b", 2);
        assert!(!miss.loaded);
        assert_eq!(miss.cleared, vec!["a"]);
    }

    #[test]
    fn test_purge_expired_ignores_threshold() {
        let (map, clock) = manual_map(100);

        map.store("old", 1);
        clock.advance(Duration::from_millis(20));
        map.store("new", 2);

        assert_eq!(map.purge_expired(), vec!["old"]);
        assert_eq!(map.load("new"), Some(2));
    }

    #[test]
    fn test_range_visits_all() {
        let (map, _) = manual_map(100);
        map.store("a", 1);
        map.store("b", 2);
        map.store("c", 3);

        let mut seen = HashSet::new();
        map.range(|key, _| {
            seen.insert(*key);
            true
        });

        assert_eq!(seen, HashSet::from(["a", "b", "c"]));
    }

    #[test]
    fn test_range_stops_early() {
        let (map, _) = manual_map(100);
        map.store("a", 1);
        map.store("b", 2);
        map.store("c", 3);

        let mut visits = 0;
        map.range(|_, _| {
            visits += 1;
            false
        });

        assert_eq!(visits, 1);
    }

    #[test]
    fn test_range_visitor_may_mutate_map() {
        let (map, _) = manual_map(100);
        map.store("a", 1);
        map.store("b", 2);

        map.range(|key, _| {
            map.delete(key);
            true
        });

        assert!(map.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let (map, _) = manual_map(100);
        let other = map.clone();

        other.store("shared", 1);
        assert_eq!(map.load("shared"), Some(1));
    }

    #[test]
    fn test_clear() {
        let (map, _) = manual_map(100);
        map.store("a", 1);
        map.store("b", 2);

        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn test_with_init_runs_before_allocation() {
        let map: CacheMap<u32, u32> = CacheMap::with_init(CacheMapConfig::default(), |cfg| {
            cfg.size_threshold = 5;
            cfg.touch_policy = TouchPolicy::OnWriteOnly;
        });

        assert_eq!(map.size_threshold(), 5);
        assert_eq!(map.touch_policy(), TouchPolicy::OnWriteOnly);
    }

    #[test]
    fn test_oversized_initial_capacity_still_builds() {
        let config = CacheMapConfig::new(4, TTL).with_initial_capacity(usize::MAX);
        let map: CacheMap<u64, u64> = CacheMap::with_config(config);

        assert!(map.store(1, 10).is_empty());
        assert_eq!(map.load(&1), Some(10));
    }

    #[test]
    fn test_initial_capacity_from_init_hook() {
        let map: LocalCacheMap<u64, u64> =
            LocalCacheMap::with_init(CacheMapConfig::default(), |cfg| {
                cfg.initial_capacity = usize::MAX;
            });

        map.store(7, 70);
        assert_eq!(map.load(&7), Some(70));
    }

    #[test]
    fn test_local_map() {
        let clock = ManualClock::new();
        let map: LocalCacheMap<&str, i32> =
            LocalCacheMap::with_clock(CacheMapConfig::new(1, TTL), clock.clone());
        assert!(!map.is_concurrent());

        map.store("a", 1);
        clock.advance(Duration::from_millis(20));

        assert_eq!(map.store("b", 2), vec!["a"]);
        assert_eq!(map.load("b"), Some(2));
        assert_eq!(map.load_and_delete("b"), Some(2));
        assert!(map.is_empty());
    }

    #[test]
    fn test_debug_output() {
        let (map, _) = manual_map(4);
        map.store("a", 1);

        let output = format!("{:?}", map);
        assert!(output.contains("concurrent: true"));
        assert!(output.contains("len: 1"));
    }
}
