//! Timed Cache Module
//!
//! Unbounded cache whose entries leave only by expiry, with optional
//! background pruning on a shared [`PruneScheduler`].

use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheStore, EntryStore, HashEntries, TimedPolicy};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{PruneHandle, PruneScheduler};

// == Timed Cache ==
/// Expiry-only cache. Dereferences to its [`CacheStore`].
///
/// Scheduled prunes go through the store's own lock, so they serialize with
/// foreground reads and writes on the same cache.
pub struct TimedCache<K, V> {
    store: Arc<CacheStore<K, V>>,
    scheduler: PruneScheduler,
    prune_job: Mutex<Option<PruneHandle>>,
}

impl<K, V> TimedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a timed cache backed by a plain hash container.
    ///
    /// # Arguments
    /// * `default_ttl_ms` - TTL applied by `put`, 0 for no expiration
    /// * `scheduler` - Shared pool used by [`schedule_prune`](Self::schedule_prune)
    pub fn new(default_ttl_ms: u64, scheduler: PruneScheduler) -> Self {
        Self::with_entries(default_ttl_ms, Box::new(HashEntries::new()), scheduler)
    }

    /// Creates a timed cache over a caller-supplied backing container.
    pub fn with_entries(
        default_ttl_ms: u64,
        entries: Box<dyn EntryStore<K, V>>,
        scheduler: PruneScheduler,
    ) -> Self {
        Self {
            store: Arc::new(CacheStore::with_policy(
                0,
                default_ttl_ms,
                Box::new(TimedPolicy),
                entries,
            )),
            scheduler,
            prune_job: Mutex::new(None),
        }
    }

    /// Creates a timed cache and, when `prune_interval_ms` is non-zero,
    /// schedules its background prune at that interval.
    pub fn from_config(config: &CacheConfig, scheduler: PruneScheduler) -> Result<Self> {
        let cache = Self::new(config.default_ttl_ms, scheduler);
        if config.prune_interval_ms > 0 {
            cache.schedule_prune(config.prune_interval_ms)?;
        }
        Ok(cache)
    }

    // == Schedule Prune ==
    /// Prunes this cache every `delay_ms`, starting `delay_ms` from now.
    ///
    /// Replaces any earlier schedule of this cache. The task holds only a weak
    /// reference, so a dropped cache is never kept alive by its schedule.
    pub fn schedule_prune(&self, delay_ms: u64) -> Result<()> {
        let store = Arc::downgrade(&self.store);
        let handle = self.scheduler.schedule(
            move || {
                let Some(store) = store.upgrade() else {
                    return;
                };
                // Same lock as foreground operations
                let removed = store.prune();
                if removed > 0 {
                    info!("Scheduled prune: removed {} expired entries", removed);
                } else {
                    debug!("Scheduled prune: no expired entries found");
                }
            },
            delay_ms,
        )?;

        if let Some(previous) = self.prune_job.lock().replace(handle) {
            previous.cancel();
        }
        Ok(())
    }

    // == Cancel Prune Schedule ==
    /// Cancels this cache's schedule only. Other caches on the same scheduler
    /// keep running.
    pub fn cancel_prune_schedule(&self) {
        if let Some(handle) = self.prune_job.lock().take() {
            handle.cancel();
        }
    }

    pub fn is_prune_scheduled(&self) -> bool {
        self.prune_job
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_cancelled() && !handle.is_finished())
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> &Arc<CacheStore<K, V>> {
        &self.store
    }
}

impl<K, V> Deref for TimedCache<K, V> {
    type Target = CacheStore<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl<K, V> Drop for TimedCache<K, V> {
    fn drop(&mut self) {
        if let Some(handle) = self.prune_job.get_mut().take() {
            handle.cancel();
        }
    }
}

impl<K, V> fmt::Debug for TimedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedCache")
            .field("store", &self.store)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::sleep;
    use std::time::Duration;

    use crate::cache::LinkedEntries;

    #[test]
    fn test_timed_is_unbounded() {
        let cache: TimedCache<i32, i32> = TimedCache::new(60_000, PruneScheduler::with_workers(1));

        for i in 0..500 {
            cache.put(i, i * 2);
        }

        assert_eq!(cache.capacity(), 0);
        assert!(!cache.is_full());
        assert_eq!(cache.len(), 500);
        assert_eq!(cache.policy_name(), "timed");
    }

    #[test]
    fn test_timed_manual_prune() {
        let cache: TimedCache<&str, &str> = TimedCache::new(0, PruneScheduler::with_workers(1));
        cache.put_with_ttl("k", "v", 50);

        assert_eq!(cache.prune(), 0);
        assert_eq!(cache.get(&"k"), Some("v"));

        sleep(Duration::from_millis(80));

        assert_eq!(cache.prune(), 1);
        assert_eq!(cache.get(&"k"), None);
    }

    #[test]
    fn test_timed_scheduled_prune() {
        let scheduler = PruneScheduler::with_workers(2);
        let cache: TimedCache<&str, i32> = TimedCache::new(30, scheduler.clone());
        let evicted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evicted);
        cache.set_listener(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        cache.put("a", 1);
        cache.put("b", 2);
        cache.schedule_prune(20).unwrap();
        assert!(cache.is_prune_scheduled());

        sleep(Duration::from_millis(200));

        // Removed in the background, without any foreground read
        assert!(cache.is_empty());
        assert_eq!(evicted.load(Ordering::SeqCst), 2);
        scheduler.shutdown();
    }

    #[test]
    fn test_cancel_prune_schedule_is_per_cache() {
        let scheduler = PruneScheduler::with_workers(2);
        let first: TimedCache<&str, i32> = TimedCache::new(20, scheduler.clone());
        let second: TimedCache<&str, i32> = TimedCache::new(20, scheduler.clone());

        first.schedule_prune(10).unwrap();
        second.schedule_prune(10).unwrap();
        first.cancel_prune_schedule();
        assert!(!first.is_prune_scheduled());

        first.put("k", 1);
        second.put("k", 1);
        sleep(Duration::from_millis(150));

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 0);
        scheduler.shutdown();
    }

    #[test]
    fn test_reschedule_replaces_previous_job() {
        let scheduler = PruneScheduler::with_workers(1);
        let cache: TimedCache<u8, u8> = TimedCache::new(0, scheduler.clone());

        cache.schedule_prune(60_000).unwrap();
        cache.schedule_prune(60_000).unwrap();

        assert_eq!(scheduler.active_tasks(), 1);
        drop(cache);
        assert_eq!(scheduler.active_tasks(), 0);
        scheduler.shutdown();
    }

    #[test]
    fn test_schedule_after_shutdown_fails() {
        let scheduler = PruneScheduler::with_workers(1);
        scheduler.shutdown();
        let cache: TimedCache<u8, u8> = TimedCache::new(10, scheduler);

        assert!(cache.schedule_prune(10).is_err());
        assert!(!cache.is_prune_scheduled());
    }

    #[test]
    fn test_from_config_schedules_prune() {
        let scheduler = PruneScheduler::with_workers(1);
        let config = CacheConfig {
            default_ttl_ms: 20,
            prune_interval_ms: 15,
            ..CacheConfig::default()
        };
        let cache: TimedCache<&str, i32> = TimedCache::from_config(&config, scheduler.clone()).unwrap();
        assert!(cache.is_prune_scheduled());
        cache.put("k", 1);

        sleep(Duration::from_millis(120));

        assert!(cache.is_empty());
        let manual: TimedCache<&str, i32> = TimedCache::from_config(
            &CacheConfig {
                prune_interval_ms: 0,
                ..CacheConfig::default()
            },
            scheduler.clone(),
        )
        .unwrap();
        assert!(!manual.is_prune_scheduled());
        scheduler.shutdown();
    }

    #[test]
    fn test_timed_with_custom_entries() {
        let cache: TimedCache<&str, i32> = TimedCache::with_entries(
            0,
            Box::new(LinkedEntries::insertion_ordered()),
            PruneScheduler::with_workers(1),
        );
        cache.put("first", 1);
        cache.put("second", 2);

        let keys: Vec<&str> = cache.iter().map(|e| *e.key()).collect();
        assert_eq!(keys, vec!["first", "second"]);
    }
}
