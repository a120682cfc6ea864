//! Map Verbs Module
//!
//! The verb set shared by `CacheMap` and `SyncMap`, so host code can be
//! written once against either.

use std::hash::Hash;

use crate::cache::{CacheMap, LockMode};
use crate::sync_map::SyncMap;

// == Load Or Store Outcome ==
/// Result of a `load_or_store` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOrStore<K, V> {
    /// The value now associated with the key
    pub actual: V,
    /// True if the key was already present and nothing was inserted
    pub loaded: bool,
    /// Keys removed by a sweep the insert triggered; always empty for maps
    /// without expiry
    pub cleared: Vec<K>,
}

// == Map Verbs Trait ==
pub trait MapVerbs<K, V> {
    /// Returns a copy of the value for `key`.
    fn load(&self, key: &K) -> Option<V>;

    /// Inserts or replaces; returns keys cleared by any sweep.
    fn store(&self, key: K, value: V) -> Vec<K>;

    /// Returns the present value, or inserts `value` atomically.
    fn load_or_store(&self, key: K, value: V) -> LoadOrStore<K, V>;

    /// Removes `key`, returning its value if present.
    fn load_and_delete(&self, key: &K) -> Option<V>;

    /// Removes `key` if present.
    fn delete(&self, key: &K);

    /// Visits entries until `visit` returns false.
    fn range<F>(&self, visit: F)
    where
        F: FnMut(&K, &V) -> bool;
}

impl<K, V, L> MapVerbs<K, V> for CacheMap<K, V, L>
where
    K: Eq + Hash + Clone,
    V: Clone,
    L: LockMode,
{
    fn load(&self, key: &K) -> Option<V> {
        CacheMap::load(self, key)
    }

    fn store(&self, key: K, value: V) -> Vec<K> {
        CacheMap::store(self, key, value)
    }

    fn load_or_store(&self, key: K, value: V) -> LoadOrStore<K, V> {
        CacheMap::load_or_store(self, key, value)
    }

    fn load_and_delete(&self, key: &K) -> Option<V> {
        CacheMap::load_and_delete(self, key)
    }

    fn delete(&self, key: &K) {
        CacheMap::delete(self, key)
    }

    fn range<F>(&self, visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        CacheMap::range(self, visit)
    }
}

impl<K, V> MapVerbs<K, V> for SyncMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn load(&self, key: &K) -> Option<V> {
        SyncMap::load(self, key)
    }

    fn store(&self, key: K, value: V) -> Vec<K> {
        SyncMap::store(self, key, value);
        Vec::new()
    }

    fn load_or_store(&self, key: K, value: V) -> LoadOrStore<K, V> {
        let (actual, loaded) = SyncMap::load_or_store(self, key, value);
        LoadOrStore {
            actual,
            loaded,
            cleared: Vec::new(),
        }
    }

    fn load_and_delete(&self, key: &K) -> Option<V> {
        SyncMap::load_and_delete(self, key)
    }

    fn delete(&self, key: &K) {
        SyncMap::delete(self, key)
    }

    fn range<F>(&self, visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        SyncMap::range(self, visit)
    }
}
