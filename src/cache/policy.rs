//! Eviction Policy Module
//!
//! Strategies plugged into a [`CacheStore`](crate::cache::CacheStore) to decide
//! which entries a sweep removes.

use tracing::debug;

use crate::cache::{CacheEntry, EntryStore};

// == Eviction Policy Trait ==
/// Sweep strategy held by a store.
///
/// A sweep runs under the store's write lock and returns every entry it
/// removed so the store can notify its listener once per entry.
pub trait EvictionPolicy<K, V>: Send + Sync {
    fn name(&self) -> &'static str;

    fn sweep(&self, entries: &mut dyn EntryStore<K, V>, capacity: usize) -> Vec<CacheEntry<K, V>>;
}

/// Removes every expired entry, in the container's iteration order.
fn remove_expired<K, V>(entries: &mut dyn EntryStore<K, V>) -> Vec<CacheEntry<K, V>> {
    let mut removed = Vec::new();
    for key in entries.keys() {
        let expired = entries.peek(&key).is_some_and(CacheEntry::is_expired);
        if expired {
            removed.extend(entries.remove(&key));
        }
    }
    removed
}

// == FIFO ==
/// First in, first out.
///
/// Expired entries are swept first; if the store is still full afterwards the
/// oldest surviving entry is evicted no matter how recently it was read.
#[derive(Debug, Default, Clone, Copy)]
pub struct FifoPolicy;

impl<K, V> EvictionPolicy<K, V> for FifoPolicy {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn sweep(&self, entries: &mut dyn EntryStore<K, V>, capacity: usize) -> Vec<CacheEntry<K, V>> {
        let mut removed = Vec::new();
        let mut oldest_survivor = None;

        for key in entries.keys() {
            let expired = entries.peek(&key).is_some_and(CacheEntry::is_expired);
            if expired {
                removed.extend(entries.remove(&key));
            } else if oldest_survivor.is_none() {
                oldest_survivor = Some(key);
            }
        }

        if capacity > 0 && entries.len() >= capacity {
            if let Some(entry) = oldest_survivor.and_then(|key| entries.remove(&key)) {
                debug!(capacity, "fifo evicted oldest entry");
                removed.push(entry);
            }
        }
        removed
    }
}

// == LRU ==
/// Least recently used.
///
/// Capacity eviction happens inside the access-ordered container at insert
/// time; a sweep only removes expired entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct LruPolicy;

impl<K, V> EvictionPolicy<K, V> for LruPolicy {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn sweep(&self, entries: &mut dyn EntryStore<K, V>, _capacity: usize) -> Vec<CacheEntry<K, V>> {
        remove_expired(entries)
    }
}

// == Timed ==
/// Unbounded, expiry-only eviction.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimedPolicy;

impl<K, V> EvictionPolicy<K, V> for TimedPolicy {
    fn name(&self) -> &'static str {
        "timed"
    }

    fn sweep(&self, entries: &mut dyn EntryStore<K, V>, _capacity: usize) -> Vec<CacheEntry<K, V>> {
        remove_expired(entries)
    }
}
