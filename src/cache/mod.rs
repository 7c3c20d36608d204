//! Cache Module
//!
//! Provides bounded FIFO and LRU stores, an unbounded timed store, and a
//! two-tier generational cache.

mod entries;
mod entry;
mod generational;
mod iter;
mod order;
mod policy;
mod store;
mod timed;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entries::{EntryStore, HashEntries, LinkedEntries};
pub use entry::CacheEntry;
pub use generational::GenerationalCache;
pub use iter::{EntryIter, ValueIter};
pub use order::LinkedOrder;
pub use policy::{EvictionPolicy, FifoPolicy, LruPolicy, TimedPolicy};
pub use store::{CacheStore, RemovalListener};
pub use timed::TimedCache;
