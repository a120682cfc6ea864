//! Expiry Sweeper Task
//!
//! Background task that periodically purges expired map entries.

use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheMap;

/// Spawns a background task that purges expired entries from `map`.
///
/// The task loops forever, sleeping `interval` between sweeps. Each sweep
/// takes exclusive access to the map just long enough to scan it once.
///
/// # Returns
/// A JoinHandle for the spawned task; abort it to stop sweeping.
///
/// # Example
/// ```ignore
/// let map: CacheMap<String, Vec<u8>> = CacheMap::new(1000, Duration::from_secs(300));
/// let sweeper = spawn_sweeper(map.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweeper<K, V>(map: CacheMap<K, V>, interval: Duration) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting expiry sweeper with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = map.purge_expired().len();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
