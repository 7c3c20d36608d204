//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with access tracking and TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached value with its access and expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    key: K,
    value: V,
    /// Last time the entry was written or read with refresh
    last_access: Instant,
    /// Number of reads served by this entry
    access_count: u64,
    /// Lifespan in milliseconds measured from last access, 0 = never expires
    ttl_ms: u64,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under
    /// * `value` - The value to store
    /// * `ttl_ms` - Lifespan in milliseconds, 0 for no expiration
    pub fn new(key: K, value: V, ttl_ms: u64) -> Self {
        Self {
            key,
            value,
            last_access: Instant::now(),
            access_count: 0,
            ttl_ms,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: the entry is expired as soon as the elapsed time
    /// since last access reaches the TTL. An entry with TTL 0 never expires.
    pub fn is_expired(&self) -> bool {
        self.ttl_ms > 0 && self.last_access.elapsed() >= Duration::from_millis(self.ttl_ms)
    }

    // == Get ==
    /// Records a read and returns the value.
    ///
    /// The access counter is always incremented; the last access time is
    /// only refreshed when `update_last_access` is set.
    pub fn get(&mut self, update_last_access: bool) -> &V {
        if update_last_access {
            self.last_access = Instant::now();
        }
        self.access_count += 1;
        &self.value
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    // == Time To Live ==
    /// Returns remaining lifespan in milliseconds, or None if the entry never expires.
    ///
    /// # Returns
    /// - `Some(0)` once the entry has expired
    /// - `Some(remaining_ms)` while it is still live
    /// - `None` if the entry has no TTL
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        if self.ttl_ms == 0 {
            return None;
        }
        let elapsed = self.last_access.elapsed().as_millis();
        Some((self.ttl_ms as u128).saturating_sub(elapsed) as u64)
    }

    /// Consumes the entry, returning its key and value.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}
