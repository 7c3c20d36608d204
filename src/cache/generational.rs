//! Generational Cache Module
//!
//! Two-tier cache: a concurrent hot tier (eden) that is demoted in bulk into a
//! bounded cold tier (longterm) once it outgrows its threshold.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::LinkedOrder;
use crate::config::CacheConfig;

// == Longterm Tier ==
/// Cold tier with a hard capacity and least-recently-used eviction.
struct Longterm<K, V> {
    values: HashMap<K, V>,
    recency: LinkedOrder<K>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> Longterm<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            values: HashMap::new(),
            recency: LinkedOrder::new(),
            capacity,
        }
    }

    fn insert(&mut self, key: K, value: V) {
        self.recency.touch(&key);
        self.values.insert(key, value);
        while self.values.len() > self.capacity {
            let Some(eldest) = self.recency.evict_oldest() else {
                break;
            };
            self.values.remove(&eldest);
            debug!(capacity = self.capacity, "Evicted longterm entry at hard cap");
        }
    }

    fn take(&mut self, key: &K) -> Option<V> {
        self.recency.remove(key);
        self.values.remove(key)
    }

    fn clear(&mut self) {
        self.values.clear();
        self.recency.clear();
    }
}

// == Generational Cache ==
/// Concurrent two-generation cache.
///
/// Reads and writes that stay in eden never touch the longterm lock. When a
/// put finds eden above its threshold, the whole eden generation is moved to
/// longterm under that lock before the new entry is inserted. A longterm hit
/// moves the entry back into eden.
///
/// Longterm has a hard capacity. Entries beyond it are evicted least
/// recently demoted first, so older entries are retrievable only while they
/// fit in that bound.
pub struct GenerationalCache<K, V> {
    eden: DashMap<K, V>,
    longterm: Mutex<Longterm<K, V>>,
    threshold: usize,
}

impl<K, V> GenerationalCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache whose longterm tier holds ten eden generations.
    pub fn new(threshold: usize) -> Self {
        Self::with_longterm_capacity(threshold, threshold.saturating_mul(10).max(1))
    }

    pub fn with_longterm_capacity(threshold: usize, longterm_capacity: usize) -> Self {
        Self {
            eden: DashMap::new(),
            longterm: Mutex::new(Longterm::new(longterm_capacity.max(1))),
            threshold,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_longterm_capacity(config.eden_threshold, config.longterm_capacity)
    }

    // == Get ==
    /// Looks up eden first, then longterm, promoting a longterm hit into eden.
    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(value) = self.eden.get(key) {
            return Some(value.value().clone());
        }
        let mut longterm = self.longterm.lock();
        // Another reader may have promoted the key while we waited
        if let Some(value) = self.eden.get(key) {
            return Some(value.value().clone());
        }
        let promoted = longterm.take(key)?;
        // Eden is filled before the longterm lock is released, so the key is
        // never missing from both tiers. A concurrent put of the same key wins.
        let value = self.eden.entry(key.clone()).or_insert(promoted).value().clone();
        Some(value)
    }

    // == Put ==
    /// Inserts into eden, demoting the current generation first if eden is
    /// above its threshold.
    pub fn put(&self, key: K, value: V) {
        if self.eden.len() > self.threshold {
            self.demote();
        }
        self.eden.insert(key, value);
    }

    // == Remove ==
    /// Removes a key from both tiers, returning the eden value if present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut longterm = self.longterm.lock();
        let from_eden = self.eden.remove(key).map(|(_, value)| value);
        let from_longterm = longterm.take(key);
        from_eden.or(from_longterm)
    }

    // == Snapshots ==
    /// Copies every entry. Eden values win over longterm on a shared key.
    pub fn get_all(&self) -> HashMap<K, V> {
        let longterm = self.longterm.lock();
        self.snapshot(&longterm)
    }

    /// Removes every entry from both tiers, returning what was removed.
    pub fn remove_all(&self) -> HashMap<K, V> {
        let mut longterm = self.longterm.lock();
        let all = self.snapshot(&longterm);
        self.eden.clear();
        longterm.clear();
        all
    }

    // == Inspection ==
    /// Returns true if either tier holds the key, without promoting it.
    pub fn contains_key(&self, key: &K) -> bool {
        self.eden.contains_key(key) || self.longterm.lock().values.contains_key(key)
    }

    /// Number of distinct keys across both tiers.
    pub fn len(&self) -> usize {
        let longterm = self.longterm.lock();
        let shadowed = longterm
            .values
            .keys()
            .filter(|key| self.eden.contains_key(*key))
            .count();
        self.eden.len() + longterm.values.len() - shadowed
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn eden_len(&self) -> usize {
        self.eden.len()
    }

    pub fn longterm_len(&self) -> usize {
        self.longterm.lock().values.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn longterm_capacity(&self) -> usize {
        self.longterm.lock().capacity
    }

    fn demote(&self) {
        let mut longterm = self.longterm.lock();
        // Another writer may have demoted while we waited for the lock
        if self.eden.len() <= self.threshold {
            return;
        }
        let keys: Vec<K> = self.eden.iter().map(|entry| entry.key().clone()).collect();
        let mut demoted = 0usize;
        for key in keys {
            if let Some((key, value)) = self.eden.remove(&key) {
                longterm.insert(key, value);
                demoted += 1;
            }
        }
        debug!(demoted, longterm = longterm.values.len(), "Demoted eden generation");
    }

    fn snapshot(&self, longterm: &Longterm<K, V>) -> HashMap<K, V> {
        let mut all = HashMap::with_capacity(self.eden.len() + longterm.values.len() + 1);
        all.extend(
            longterm
                .values
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        for entry in self.eden.iter() {
            all.insert(entry.key().clone(), entry.value().clone());
        }
        all
    }
}

impl<K, V> fmt::Debug for GenerationalCache<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationalCache")
            .field("threshold", &self.threshold)
            .field("eden_len", &self.eden.len())
            .field("longterm_len", &self.longterm.lock().values.len())
            .finish()
    }
}
