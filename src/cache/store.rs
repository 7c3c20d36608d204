//! Cache Store Module
//!
//! Generic cache skeleton: capacity, default TTL, removal listener and a
//! store-wide lock around a backing container. Eviction decisions are
//! delegated to the store's [`EvictionPolicy`].

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::cache::{
    CacheEntry, EntryIter, EntryStore, EvictionPolicy, FifoPolicy, LinkedEntries, LruPolicy,
    ValueIter,
};
use crate::config::CacheConfig;

/// Callback invoked once per entry removed by expiry or eviction.
pub type RemovalListener<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

// == Cache Store ==
/// Thread-safe cache with a pluggable eviction policy.
pub struct CacheStore<K, V> {
    /// Backing container, guarded by the store-wide lock
    entries: RwLock<Box<dyn EntryStore<K, V>>>,
    policy: Box<dyn EvictionPolicy<K, V>>,
    listener: RwLock<Option<RemovalListener<K, V>>>,
    /// Maximum number of entries, 0 = unbounded
    capacity: usize,
    /// Default TTL in milliseconds, 0 = never expires
    default_ttl_ms: u64,
    /// Whether reads refresh last access time
    refresh_on_read: bool,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a store with an explicit policy and backing container.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, 0 for unbounded
    /// * `default_ttl_ms` - TTL applied by [`put`](Self::put), 0 for no expiration
    /// * `policy` - Sweep strategy used on overflow and by [`prune`](Self::prune)
    /// * `entries` - Backing container
    pub fn with_policy(
        capacity: usize,
        default_ttl_ms: u64,
        policy: Box<dyn EvictionPolicy<K, V>>,
        entries: Box<dyn EntryStore<K, V>>,
    ) -> Self {
        Self {
            entries: RwLock::new(entries),
            policy,
            listener: RwLock::new(None),
            capacity: clamp_capacity(capacity),
            default_ttl_ms,
            refresh_on_read: true,
        }
    }

    /// Creates a first-in-first-out store.
    pub fn fifo(capacity: usize, default_ttl_ms: u64) -> Self {
        Self::with_policy(
            capacity,
            default_ttl_ms,
            Box::new(FifoPolicy),
            Box::new(LinkedEntries::insertion_ordered()),
        )
    }

    /// Creates a least-recently-used store.
    pub fn lru(capacity: usize, default_ttl_ms: u64) -> Self {
        let capacity = clamp_capacity(capacity);
        Self::with_policy(
            capacity,
            default_ttl_ms,
            Box::new(LruPolicy),
            Box::new(LinkedEntries::access_ordered(capacity)),
        )
    }

    pub fn fifo_from_config(config: &CacheConfig) -> Self {
        Self::fifo(config.capacity, config.default_ttl_ms).refresh_on_read(config.refresh_on_read)
    }

    pub fn lru_from_config(config: &CacheConfig) -> Self {
        Self::lru(config.capacity, config.default_ttl_ms).refresh_on_read(config.refresh_on_read)
    }

    /// Sets whether [`get`](Self::get) refreshes an entry's last access time.
    pub fn refresh_on_read(mut self, refresh: bool) -> Self {
        self.refresh_on_read = refresh;
        self
    }

    // == Listener ==
    /// Installs the callback notified of expiry and eviction removals.
    ///
    /// Explicit [`remove`](Self::remove) and [`clear`](Self::clear) calls are
    /// not reported. The callback runs after the store lock is released.
    pub fn set_listener<F>(&self, on_remove: F)
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        *self.listener.write() = Some(Arc::new(on_remove));
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed, reported to the listener, and read as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_with_refresh(key, self.refresh_on_read)
    }

    /// Retrieves a value, choosing whether this read refreshes last access time.
    pub fn get_with_refresh(&self, key: &K, refresh: bool) -> Option<V> {
        let mut entries = self.entries.write();
        let expired = entries.peek(key)?.is_expired();
        if expired {
            let removed = entries.remove(key);
            drop(entries);
            self.notify(removed.as_slice());
            return None;
        }
        entries.get_mut(key).map(|entry| entry.get(refresh).clone())
    }

    // == Put ==
    /// Stores a value with the default TTL.
    pub fn put(&self, key: K, value: V) {
        self.put_with_ttl(key, value, self.default_ttl_ms);
    }

    /// Stores a value with an explicit TTL in milliseconds (0 = never expires).
    ///
    /// Any put into a full store runs the policy sweep first, overwrites
    /// included.
    pub fn put_with_ttl(&self, key: K, value: V, ttl_ms: u64) {
        let removed = {
            let mut entries = self.entries.write();
            let mut removed = Vec::new();
            if self.is_full_locked(&**entries) {
                removed = self.policy.sweep(&mut **entries, self.capacity);
            }
            removed.extend(entries.insert(CacheEntry::new(key, value, ttl_ms)));
            removed
        };
        self.notify(&removed);
    }

    // == Remove ==
    /// Removes an entry by key, returning its value if it was present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let removed = self.entries.write().remove(key)?;
        Some(removed.into_parts().1)
    }

    // == Prune ==
    /// Runs the policy sweep regardless of capacity.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&self) -> usize {
        let removed = {
            let mut entries = self.entries.write();
            self.policy.sweep(&mut **entries, self.capacity)
        };
        if !removed.is_empty() {
            debug!(policy = self.policy.name(), removed = removed.len(), "pruned cache");
        }
        self.notify(&removed);
        removed.len()
    }

    // == Iteration ==
    /// Iterates live entries. The sequence is captured under the read lock.
    pub fn iter(&self) -> EntryIter<K, V> {
        let snapshot: Vec<CacheEntry<K, V>> = self.entries.read().entries().cloned().collect();
        EntryIter::new(snapshot)
    }

    /// Iterates live values.
    pub fn values(&self) -> ValueIter<K, V> {
        ValueIter::new(self.iter())
    }

    // == Inspection ==
    /// Returns true if the store is bounded and at or above capacity.
    pub fn is_full(&self) -> bool {
        self.is_full_locked(&**self.entries.read())
    }

    /// Returns true for a live entry without recording an access.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries
            .read()
            .peek(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes every entry without notifying the listener.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl_ms
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    fn is_full_locked(&self, entries: &dyn EntryStore<K, V>) -> bool {
        self.capacity > 0 && entries.len() >= self.capacity
    }

    fn notify(&self, removed: &[CacheEntry<K, V>]) {
        if removed.is_empty() {
            return;
        }
        let listener = self.listener.read().clone();
        if let Some(on_remove) = listener {
            for entry in removed {
                on_remove(entry.key(), entry.value());
            }
        }
    }
}

impl<K, V> fmt::Debug for CacheStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("policy", &self.policy.name())
            .field("len", &self.entries.read().len())
            .field("capacity", &self.capacity)
            .field("default_ttl_ms", &self.default_ttl_ms)
            .finish()
    }
}

/// The largest representable capacity is reduced by one so the backing
/// container can always hold one entry past the bound during an insert.
fn clamp_capacity(capacity: usize) -> usize {
    if capacity == usize::MAX {
        capacity - 1
    } else {
        capacity
    }
}
