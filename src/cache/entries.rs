//! Backing Containers Module
//!
//! Associative containers holding a store's entries. Iteration and reordering
//! behavior is container specific; eviction policies are written against the
//! [`EntryStore`] trait only.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::cache::{CacheEntry, LinkedOrder};

// == Entry Store Trait ==
/// Associative container from keys to cache entries.
pub trait EntryStore<K, V>: Send + Sync {
    /// Looks up an entry for a read. Access-ordered containers reorder here.
    fn get_mut(&mut self, key: &K) -> Option<&mut CacheEntry<K, V>>;

    /// Looks up an entry without touching its position.
    fn peek(&self, key: &K) -> Option<&CacheEntry<K, V>>;

    /// Inserts or overwrites an entry.
    ///
    /// Returns the entry displaced by the container's own bound, if any.
    fn insert(&mut self, entry: CacheEntry<K, V>) -> Option<CacheEntry<K, V>>;

    fn remove(&mut self, key: &K) -> Option<CacheEntry<K, V>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// Keys in the container's iteration order.
    fn keys(&self) -> Vec<K>;

    /// Entries in the container's iteration order.
    fn entries(&self) -> Box<dyn Iterator<Item = &CacheEntry<K, V>> + '_>;
}

// == Linked Entries ==
/// Hash container with an explicit linked ordering of its keys.
///
/// In insertion order, reads and overwrites never move a key. In access
/// order, every read and write moves the key to the most recently used end,
/// and with a bound set the least recently used entry is displaced as soon as
/// an insert pushes the size past it.
#[derive(Debug)]
pub struct LinkedEntries<K, V> {
    map: HashMap<K, CacheEntry<K, V>>,
    order: LinkedOrder<K>,
    access_order: bool,
    /// Maximum size before self-eviction, 0 = never self-evict
    evict_above: usize,
}

impl<K, V> LinkedEntries<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Insertion-ordered container that never evicts by itself.
    pub fn insertion_ordered() -> Self {
        Self {
            map: HashMap::new(),
            order: LinkedOrder::new(),
            access_order: false,
            evict_above: 0,
        }
    }

    /// Access-ordered container that displaces its eldest entry past `bound`.
    ///
    /// A bound of 0 disables self-eviction.
    pub fn access_ordered(bound: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: LinkedOrder::new(),
            access_order: true,
            evict_above: bound,
        }
    }
}

impl<K, V> EntryStore<K, V> for LinkedEntries<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    fn get_mut(&mut self, key: &K) -> Option<&mut CacheEntry<K, V>> {
        if self.access_order && self.map.contains_key(key) {
            self.order.touch(key);
        }
        self.map.get_mut(key)
    }

    fn peek(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        self.map.get(key)
    }

    fn insert(&mut self, entry: CacheEntry<K, V>) -> Option<CacheEntry<K, V>> {
        let key = entry.key().clone();
        if self.access_order {
            self.order.touch(&key);
        } else {
            self.order.push_back(&key);
        }
        self.map.insert(key, entry);

        if self.evict_above > 0 && self.map.len() > self.evict_above {
            let eldest = self.order.evict_oldest()?;
            debug!(bound = self.evict_above, "displaced least recently used entry");
            return self.map.remove(&eldest);
        }
        None
    }

    fn remove(&mut self, key: &K) -> Option<CacheEntry<K, V>> {
        self.order.remove(key);
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn keys(&self) -> Vec<K> {
        self.order.iter().cloned().collect()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = &CacheEntry<K, V>> + '_> {
        Box::new(self.order.iter().filter_map(move |key| self.map.get(key)))
    }
}

// == Hash Entries ==
/// Plain hash container with unspecified iteration order.
#[derive(Debug)]
pub struct HashEntries<K, V> {
    map: HashMap<K, CacheEntry<K, V>>,
}

impl<K, V> HashEntries<K, V> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<K, V> Default for HashEntries<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> EntryStore<K, V> for HashEntries<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    fn get_mut(&mut self, key: &K) -> Option<&mut CacheEntry<K, V>> {
        self.map.get_mut(key)
    }

    fn peek(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        self.map.get(key)
    }

    fn insert(&mut self, entry: CacheEntry<K, V>) -> Option<CacheEntry<K, V>> {
        self.map.insert(entry.key().clone(), entry);
        None
    }

    fn remove(&mut self, key: &K) -> Option<CacheEntry<K, V>> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn keys(&self) -> Vec<K> {
        self.map.keys().cloned().collect()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = &CacheEntry<K, V>> + '_> {
        Box::new(self.map.values())
    }
}
