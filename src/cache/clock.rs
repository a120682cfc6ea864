//! Clock Module
//!
//! Time sources for entry timestamps. Timestamps are nanoseconds elapsed since
//! the clock's origin, which keeps them monotonic and fits them in a `u64`.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// == Clock Trait ==
/// Source of the "now" used to stamp and age entries.
pub trait Clock: Debug + Send + Sync {
    /// Returns the current time as nanoseconds since the clock's origin.
    fn now_nanos(&self) -> u64;
}

// == Monotonic Clock ==
/// Default clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_nanos(&self) -> u64 {
        duration_to_nanos(self.origin.elapsed())
    }
}

// == Manual Clock ==
/// Clock that only moves when advanced. Clones share the same time, so a
/// test can keep one handle and give another to the map.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock stopped at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(duration_to_nanos(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> u64 {
        self.nanos.load(Ordering::SeqCst)
    }
}

/// Converts a duration to whole nanoseconds, saturating at `u64::MAX`.
pub(crate) fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
