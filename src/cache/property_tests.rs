//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check eviction, expiry and generational behavior over
//! generated operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::thread::sleep;
use std::time::Duration;

use crate::cache::{CacheStore, GenerationalCache};

// == Test Configuration ==
const TEST_CAPACITY: usize = 50;

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}"
}

/// Generates distinct keys, in generation order
fn unique_keys(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(key_strategy(), min..max).prop_map(|keys| {
        let mut seen = HashSet::new();
        keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
    })
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: u32 },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any operation sequence, a bounded store never holds more than its
    // capacity once a put returns.
    #[test]
    fn prop_capacity_enforcement(ops in prop::collection::vec(cache_op_strategy(), 1..300)) {
        let fifo = CacheStore::fifo(TEST_CAPACITY, 0);
        let lru = CacheStore::lru(TEST_CAPACITY, 0);

        for op in ops {
            for store in [&fifo, &lru] {
                match &op {
                    CacheOp::Put { key, value } => store.put(key.clone(), *value),
                    CacheOp::Get { key } => {
                        store.get(key);
                    }
                    CacheOp::Remove { key } => {
                        store.remove(key);
                    }
                }
                prop_assert!(store.len() <= TEST_CAPACITY, "{} store exceeded capacity", store.policy_name());
            }
        }
    }

    // Storing then reading a key before expiry returns the stored value; an
    // overwrite replaces it; a removal makes it absent.
    #[test]
    fn prop_put_get_remove(key in key_strategy(), v1 in any::<u32>(), v2 in any::<u32>()) {
        let store = CacheStore::lru(TEST_CAPACITY, 0);

        store.put(key.clone(), v1);
        prop_assert_eq!(store.get(&key), Some(v1));

        store.put(key.clone(), v2);
        prop_assert_eq!(store.get(&key), Some(v2));
        prop_assert_eq!(store.len(), 1);

        prop_assert_eq!(store.remove(&key), Some(v2));
        prop_assert_eq!(store.get(&key), None);
    }

    // FIFO evicts the first inserted key even if it was just read.
    #[test]
    fn prop_fifo_ignores_reads(keys in unique_keys(3, 10), new_key in key_strategy()) {
        prop_assume!(keys.len() >= 2);
        prop_assume!(!keys.contains(&new_key));

        let store = CacheStore::fifo(keys.len(), 0);
        for key in &keys {
            store.put(key.clone(), 0u32);
        }
        for key in &keys {
            store.get(key);
        }
        store.put(new_key.clone(), 1);

        prop_assert_eq!(store.len(), keys.len());
        prop_assert!(store.get(&keys[0]).is_none(), "first inserted key should be evicted");
        for key in keys.iter().skip(1) {
            prop_assert!(store.get(key).is_some());
        }
        prop_assert_eq!(store.get(&new_key), Some(1));
    }

    // LRU evicts the least recently read key.
    #[test]
    fn prop_lru_eviction_order(keys in unique_keys(3, 10), new_key in key_strategy()) {
        prop_assume!(keys.len() >= 3);
        prop_assume!(!keys.contains(&new_key));

        let store = CacheStore::lru(keys.len(), 0);
        for key in &keys {
            store.put(key.clone(), 0u32);
        }

        // Reading the first key makes the second one the eviction candidate
        store.get(&keys[0]);
        store.put(new_key.clone(), 1);

        prop_assert!(store.get(&keys[0]).is_some());
        prop_assert!(store.get(&keys[1]).is_none());
        prop_assert_eq!(store.get(&new_key), Some(1));
    }

    // Every distinct key put into a generational cache stays retrievable while
    // the longterm tier has room for it.
    #[test]
    fn prop_generational_retains_keys(keys in unique_keys(1, 60), threshold in 1usize..8) {
        let cache = GenerationalCache::with_longterm_capacity(threshold, 1000);
        for (i, key) in keys.iter().enumerate() {
            cache.put(key.clone(), i);
        }

        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(cache.get(key), Some(i));
        }
    }

    // After remove_all, no previously inserted key is retrievable.
    #[test]
    fn prop_remove_all_empties(keys in unique_keys(1, 40), threshold in 0usize..5) {
        let cache = GenerationalCache::with_longterm_capacity(threshold, 1000);
        for key in &keys {
            cache.put(key.clone(), 1u8);
        }

        let removed = cache.remove_all();
        prop_assert_eq!(removed.len(), keys.len());
        for key in &keys {
            prop_assert_eq!(cache.get(key), None);
        }
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // Iteration never yields an entry that has expired, even one still held
    // by the store when iteration began.
    #[test]
    fn prop_iteration_skips_expired(keys in unique_keys(2, 20), split in 1usize..20) {
        let store = CacheStore::fifo(0, 0);
        let split = split.min(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let ttl = if i < split { 20 } else { 0 };
            store.put_with_ttl(key.clone(), i, ttl);
        }

        sleep(Duration::from_millis(50));

        let seen: Vec<usize> = store.values().collect();
        prop_assert_eq!(seen, (split..keys.len()).collect::<Vec<_>>());
        prop_assert_eq!(store.len(), keys.len());
    }
}
