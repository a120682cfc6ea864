//! TTL Maps - embeddable key-value maps with idle-time expiry
//!
//! `CacheMap` tracks when each entry was last touched and sweeps stale
//! entries once inserts push it past a size threshold. `SyncMap` offers the
//! same verbs over a concurrent map with no expiry.

pub mod cache;
pub mod config;
pub mod error;
pub mod sync_map;
pub mod tasks;
pub mod verbs;

pub use cache::{CacheMap, Clock, Concurrent, Local, LocalCacheMap, ManualClock, MonotonicClock};
pub use config::{CacheMapConfig, TouchPolicy};
pub use error::{MapError, Result};
pub use sync_map::SyncMap;
pub use tasks::spawn_sweeper;
pub use verbs::{LoadOrStore, MapVerbs};
