//! Cache Module
//!
//! Provides the TTL cache map: idle-time tracking, optional locking and
//! size-triggered expiry sweeps.

mod clock;
mod entry;
mod lock;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub(crate) use entry::CacheEntry;
pub use lock::{Concurrent, Local, LockMode};
pub use store::{CacheMap, LocalCacheMap};
