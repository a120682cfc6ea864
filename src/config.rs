//! Configuration Module
//!
//! Construction-time settings for `CacheMap`, loadable from environment
//! variables or embedded in a host's own serde configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

// == Defaults ==
/// Default number of entries above which an insert triggers a sweep.
pub const DEFAULT_SIZE_THRESHOLD: usize = 1024;

/// Default idle time after which an entry becomes eligible for removal.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

// == Touch Policy ==
/// Controls which verbs refresh an entry's last-touch timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPolicy {
    /// Successful reads and all writes refresh the timestamp.
    #[default]
    OnReadAndWrite,
    /// Only writes refresh the timestamp; entries expire by age since their
    /// last write.
    OnWriteOnly,
}

impl TouchPolicy {
    /// Returns true if a successful read should refresh the entry.
    pub fn touches_on_read(self) -> bool {
        matches!(self, TouchPolicy::OnReadAndWrite)
    }
}

/// Cache map configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheMapConfig {
    /// A sweep runs after any insert that grows the map beyond this count
    pub size_threshold: usize,
    /// Maximum idle time before an entry may be swept
    pub ttl: Duration,
    /// Which verbs refresh an entry's timestamp
    pub touch_policy: TouchPolicy,
    /// Capacity reserved when the storage is allocated, if it can be
    pub initial_capacity: usize,
}

impl CacheMapConfig {
    /// Creates a config with the given threshold and TTL and default policy.
    pub fn new(size_threshold: usize, ttl: Duration) -> Self {
        Self {
            size_threshold,
            ttl,
            ..Self::default()
        }
    }

    /// Sets the sweep threshold.
    pub fn with_size_threshold(mut self, size_threshold: usize) -> Self {
        self.size_threshold = size_threshold;
        self
    }

    /// Sets the idle TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets which verbs refresh timestamps.
    pub fn with_touch_policy(mut self, touch_policy: TouchPolicy) -> Self {
        self.touch_policy = touch_policy;
        self
    }

    /// Sets the capacity to reserve up front. Best effort: a capacity that
    /// cannot be reserved is skipped when the map is built.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Creates a new config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `<PREFIX>_SIZE_THRESHOLD` - Sweep threshold (default: 1024)
    /// - `<PREFIX>_TTL_MS` - Idle TTL in milliseconds (default: 300000)
    /// - `<PREFIX>_INITIAL_CAPACITY` - Reserved capacity (default: 0)
    /// - `<PREFIX>_TOUCH_ON_READ` - `true` or `false` (default: true)
    ///
    /// Unset variables fall back to defaults. A variable that is set but
    /// cannot be parsed yields `MapError::InvalidConfig`.
    pub fn from_env(prefix: &str) -> Result<Self> {
        let defaults = Self::default();

        let size_threshold =
            read_var(prefix, "SIZE_THRESHOLD")?.unwrap_or(defaults.size_threshold);
        let ttl = read_var::<u64>(prefix, "TTL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.ttl);
        let initial_capacity =
            read_var(prefix, "INITIAL_CAPACITY")?.unwrap_or(defaults.initial_capacity);
        let touch_policy = match read_var::<bool>(prefix, "TOUCH_ON_READ")? {
            Some(false) => TouchPolicy::OnWriteOnly,
            Some(true) => TouchPolicy::OnReadAndWrite,
            None => defaults.touch_policy,
        };

        Ok(Self {
            size_threshold,
            ttl,
            touch_policy,
            initial_capacity,
        })
    }
}

impl Default for CacheMapConfig {
    fn default() -> Self {
        Self {
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            ttl: DEFAULT_TTL,
            touch_policy: TouchPolicy::default(),
            initial_capacity: 0,
        }
    }
}

fn read_var<T: FromStr>(prefix: &str, name: &str) -> Result<Option<T>> {
    let key = format!("{}_{}", prefix, name);
    match env::var(&key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| MapError::InvalidConfig(format!("{}={}", key, raw))),
        Err(_) => Ok(None),
    }
}
