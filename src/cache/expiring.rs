//! In-memory response cache with periodic expiry
//!
//! Provides a `Cache` that stores raw response bodies keyed by URL. Every entry
//! records when it was inserted, and a background sweep task removes entries
//! older than the configured interval once per interval.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Errors that can occur when constructing a cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The expiry interval must be greater than zero
    #[error("Invalid cache configuration: interval must be positive, got {0:?}")]
    InvalidConfiguration(Duration),

    /// The sweep task needs a Tokio runtime to run on
    #[error("Cache must be created from within a Tokio runtime")]
    NoRuntime,
}

/// A single cached value
#[derive(Debug)]
struct CacheEntry {
    /// When the entry was inserted
    created_at: Instant,
    /// The cached payload
    value: Vec<u8>,
}

type Entries = Arc<Mutex<HashMap<String, CacheEntry>>>;

/// Concurrency-safe, time-expiring byte cache
///
/// Expiry is driven only by the background sweep: `get` never looks at an
/// entry's age, so a stale entry stays readable until the next sweep tick
/// removes it. An entry is guaranteed to survive for at least `interval`
/// and is gone after at most `2 * interval`.
///
/// Clones share the same entries and the same sweep task. The sweep stops
/// when [`Cache::close`] is called or when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct Cache {
    entries: Entries,
    interval: Duration,
    shutdown_tx: mpsc::Sender<()>,
}

impl Cache {
    /// Creates an empty cache and starts its sweep task
    ///
    /// # Arguments
    /// * `interval` - Minimum lifetime of an entry, and the sweep period
    ///
    /// # Returns
    /// * `Ok(Cache)` ready for use
    /// * `Err(CacheError::InvalidConfiguration)` if `interval` is zero
    /// * `Err(CacheError::NoRuntime)` if called outside a Tokio runtime
    pub fn new(interval: Duration) -> Result<Self, CacheError> {
        if interval.is_zero() {
            return Err(CacheError::InvalidConfiguration(interval));
        }
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let entries: Entries = Arc::new(Mutex::new(HashMap::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        runtime.spawn(reap_loop(Arc::clone(&entries), interval, shutdown_rx));

        Ok(Self {
            entries,
            interval,
            shutdown_tx,
        })
    }

    /// Inserts or overwrites the value stored under `key`
    ///
    /// Overwriting resets the entry's age.
    pub fn add(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let entry = CacheEntry {
            created_at: Instant::now(),
            value: value.into(),
        };
        lock(&self.entries).insert(key.into(), entry);
    }

    /// Returns a copy of the value stored under `key`, if any
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.entries)
            .get(key)
            .map(|entry| entry.value.clone())
    }

    /// Stops the background sweep
    ///
    /// Entries already stored stay readable but are no longer evicted.
    /// Calling this more than once is harmless.
    pub fn close(&self) {
        let _ = self.shutdown_tx.try_send(());
    }

    /// Returns the configured expiry interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the number of live entries
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns true if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Acquires the entry map, recovering from a poisoned lock
///
/// The map only holds plain data, so a panic in another holder cannot leave
/// it half-updated.
fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes every entry at least `interval` old, returning how many were removed
fn reap(entries: &Entries, interval: Duration) -> usize {
    let now = Instant::now();
    let mut map = lock(entries);
    let before = map.len();
    map.retain(|_, entry| now.duration_since(entry.created_at) < interval);
    before - map.len()
}

/// Sweeps expired entries once per interval until shut down
async fn reap_loop(entries: Entries, interval: Duration, mut shutdown_rx: mpsc::Receiver<()>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first tick (immediate)
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = reap(&entries, interval);
                if removed > 0 {
                    tracing::debug!(removed, "Reaped expired cache entries");
                }
            }
            // Fires on close() and when every sender has been dropped
            _ = shutdown_rx.recv() => {
                tracing::debug!("Cache sweep stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_new_creates_empty_cache_with_interval() {
        let cache = Cache::new(Duration::from_millis(100)).expect("Cache should be created");

        assert!(cache.is_empty());
        assert_eq!(cache.interval(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_new_rejects_zero_interval() {
        let result = Cache::new(Duration::ZERO);

        assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = Cache::new(Duration::from_secs(1));

        assert!(matches!(result, Err(CacheError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let cache = Cache::new(Duration::from_secs(60)).unwrap();

        cache.add("test-key", b"test-value".to_vec());

        assert_eq!(cache.get("test-key"), Some(b"test-value".to_vec()));
    }

    #[tokio::test]
    async fn test_get_missing_key_returns_none() {
        let cache = Cache::new(Duration::from_secs(60)).unwrap();

        assert!(cache.get("non-existent").is_none());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_latest_value() {
        let cache = Cache::new(Duration::from_secs(60)).unwrap();

        cache.add("overwrite-key", b"first-value".to_vec());
        cache.add("overwrite-key", b"second-value".to_vec());

        assert_eq!(cache.get("overwrite-key"), Some(b"second-value".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_value_is_stored() {
        let cache = Cache::new(Duration::from_secs(60)).unwrap();

        cache.add("empty-key", Vec::new());

        assert_eq!(cache.get("empty-key"), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_multiple_entries_are_independent() {
        let cache = Cache::new(Duration::from_secs(60)).unwrap();
        let entries = [("key1", "value1"), ("key2", "value2"), ("key3", "value3")];

        for (key, value) in entries {
            cache.add(key, value.as_bytes());
        }

        for (key, value) in entries {
            assert_eq!(cache.get(key).as_deref(), Some(value.as_bytes()));
        }
    }

    #[tokio::test]
    async fn test_entries_are_reaped_after_interval() {
        let interval = Duration::from_millis(100);
        let cache = Cache::new(interval).unwrap();

        cache.add("u", vec![0x61, 0x62]);
        assert_eq!(cache.get("u"), Some(vec![0x61, 0x62]));

        tokio::time::sleep(Duration::from_millis(260)).await;

        assert!(cache.get("u").is_none(), "Entry should be reaped after 2x interval");
    }

    #[tokio::test]
    async fn test_recent_entries_are_not_reaped() {
        let cache = Cache::new(Duration::from_secs(1)).unwrap();

        cache.add("keep-test", b"will-be-kept".to_vec());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get("keep-test"), Some(b"will-be-kept".to_vec()));
    }

    #[tokio::test]
    async fn test_reaping_one_key_leaves_fresh_key() {
        let interval = Duration::from_millis(200);
        let cache = Cache::new(interval).unwrap();

        cache.add("old", b"old".to_vec());
        tokio::time::sleep(Duration::from_millis(300)).await;
        cache.add("fresh", b"fresh".to_vec());
        // By 450ms "old" is past 2x interval; "fresh" is only 150ms old
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("old").is_none());
        assert_eq!(cache.get("fresh"), Some(b"fresh".to_vec()));
    }

    #[test]
    fn test_reap_removes_only_stale_entries() {
        let entries: Entries = Arc::new(Mutex::new(HashMap::new()));
        let interval = Duration::from_millis(50);
        {
            let mut map = lock(&entries);
            map.insert(
                "stale".to_string(),
                CacheEntry {
                    created_at: Instant::now() - Duration::from_millis(80),
                    value: b"stale".to_vec(),
                },
            );
            map.insert(
                "fresh".to_string(),
                CacheEntry {
                    created_at: Instant::now(),
                    value: b"fresh".to_vec(),
                },
            );
        }

        let removed = reap(&entries, interval);

        assert_eq!(removed, 1);
        let map = lock(&entries);
        assert!(map.contains_key("fresh"));
        assert!(!map.contains_key("stale"));
    }

    #[tokio::test]
    async fn test_close_stops_eviction() {
        let cache = Cache::new(Duration::from_millis(50)).unwrap();
        cache.close();
        cache.close();

        cache.add("kept", b"kept".to_vec());
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.get("kept"), Some(b"kept".to_vec()));
    }

    #[tokio::test]
    async fn test_dropping_last_handle_stops_sweep() {
        let metrics = Handle::current().metrics();
        let before = metrics.num_alive_tasks();

        let cache = Cache::new(Duration::from_millis(50)).unwrap();
        let other = cache.clone();
        assert_eq!(metrics.num_alive_tasks(), before + 1);

        drop(cache);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(metrics.num_alive_tasks(), before + 1, "A remaining clone keeps the sweep");

        drop(other);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(metrics.num_alive_tasks(), before);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = Cache::new(Duration::from_secs(60)).unwrap();
        let other = cache.clone();

        other.add("shared", b"value".to_vec());

        assert_eq!(cache.get("shared"), Some(b"value".to_vec()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_and_get() {
        let cache = Cache::new(Duration::from_secs(60)).unwrap();
        let valid: HashSet<Vec<u8>> = (0..10)
            .map(|i| format!("concurrent-value-{}", i).into_bytes())
            .collect();

        let mut tasks = Vec::new();
        for writer in 0..4 {
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..100 {
                    let value = format!("concurrent-value-{}", (writer + i) % 10);
                    cache.add("concurrent-key", value.into_bytes());
                    tokio::task::yield_now().await;
                }
                Vec::new()
            }));
        }
        for _ in 0..4 {
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..100 {
                    if let Some(value) = cache.get("concurrent-key") {
                        seen.push(value);
                    }
                    tokio::task::yield_now().await;
                }
                seen
            }));
        }

        for task in tasks {
            let seen = task.await.expect("Task should not panic");
            for value in seen {
                assert!(valid.contains(&value), "Read a value that was never written");
            }
        }
    }
}
