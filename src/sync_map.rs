//! Sync Map Module
//!
//! Typed concurrent map over `DashMap`, with the same verbs as `CacheMap` but
//! no expiry and no sweeps.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

// == Sync Map ==
/// Concurrency-safe key-value map without expiry.
///
/// Cloning the map clones the handle: every clone sees the same entries.
pub struct SyncMap<K, V> {
    inner: Arc<DashMap<K, V>>,
}

impl<K, V> SyncMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Creates an empty map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::with_capacity(capacity)),
        }
    }

    /// Returns a copy of the value for `key`.
    pub fn load<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Inserts or replaces the value for `key`.
    pub fn store(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    /// Returns `(existing, true)` if present, otherwise inserts and returns
    /// `(value, false)`. The shard lock is held across check and insert.
    pub fn load_or_store(&self, key: K, value: V) -> (V, bool) {
        match self.inner.entry(key) {
            Entry::Occupied(occupied) => (occupied.get().clone(), true),
            Entry::Vacant(vacant) => {
                vacant.insert(value.clone());
                (value, false)
            }
        }
    }

    /// Removes `key` and returns its value if it was present.
    pub fn load_and_delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(key).map(|(_, value)| value)
    }

    /// Removes `key`; a missing key is a no-op.
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(key);
    }

    /// Visits a copy of the entries, stopping once `visit` returns false.
    ///
    /// Copying first means no shard lock is held while `visit` runs.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let snapshot: Vec<(K, V)> = self
            .inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (key, value) in snapshot {
            if !visit(&key, &value) {
                break;
            }
        }
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.clear();
    }
}

impl<K: Eq + Hash, V> SyncMap<K, V> {
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K, V> Default for SyncMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for SyncMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash, V> fmt::Debug for SyncMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncMap").field("len", &self.len()).finish()
    }
}
