//! Entry Iteration Module
//!
//! Lazy, single-pass, read-only iteration over a store's live entries.

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

// == Entry Iterator ==
/// Single-pass iterator yielding only entries that are not expired.
///
/// The entry sequence is captured when the iterator is built. Expiry is
/// checked lazily, one step ahead of the caller, so an entry that expires
/// before it is reached is skipped. Expired entries are skipped, never removed
/// from the owning store.
#[derive(Debug)]
pub struct EntryIter<K, V> {
    inner: std::vec::IntoIter<CacheEntry<K, V>>,
    next_live: Option<CacheEntry<K, V>>,
}

impl<K, V> EntryIter<K, V> {
    pub(crate) fn new(entries: Vec<CacheEntry<K, V>>) -> Self {
        let mut iter = Self {
            inner: entries.into_iter(),
            next_live: None,
        };
        iter.advance();
        iter
    }

    /// Returns true while a live entry is buffered.
    pub fn has_next(&self) -> bool {
        self.next_live.is_some()
    }

    /// Returns the next live entry, failing once the iteration is exhausted.
    pub fn try_next(&mut self) -> Result<CacheEntry<K, V>> {
        let entry = self.next_live.take().ok_or(CacheError::IteratorExhausted)?;
        self.advance();
        Ok(entry)
    }

    /// Removal through an iteration is not supported.
    pub fn remove(&mut self) -> Result<()> {
        Err(CacheError::UnsupportedOperation(
            "cache iterators do not support removal",
        ))
    }

    fn advance(&mut self) {
        self.next_live = self.inner.by_ref().find(|entry| !entry.is_expired());
    }
}

impl<K, V> Iterator for EntryIter<K, V> {
    type Item = CacheEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().ok()
    }
}

// == Value Iterator ==
/// Projection of an [`EntryIter`] onto values.
#[derive(Debug)]
pub struct ValueIter<K, V> {
    entries: EntryIter<K, V>,
}

impl<K, V> ValueIter<K, V> {
    pub(crate) fn new(entries: EntryIter<K, V>) -> Self {
        Self { entries }
    }

    pub fn has_next(&self) -> bool {
        self.entries.has_next()
    }

    pub fn try_next(&mut self) -> Result<V> {
        self.entries.try_next().map(|entry| entry.into_parts().1)
    }

    pub fn remove(&mut self) -> Result<()> {
        self.entries.remove()
    }
}

impl<K, V> Iterator for ValueIter<K, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().ok()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_iter_yields_all_live_entries() {
        let entries = vec![CacheEntry::new("a", 1, 0), CacheEntry::new("b", 2, 0)];
        let keys: Vec<&str> = EntryIter::new(entries).map(|e| *e.key()).collect();

        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_iter_skips_expired_entries() {
        let entries = vec![
            CacheEntry::new("short", 1, 10),
            CacheEntry::new("long", 2, 60_000),
            CacheEntry::new("forever", 3, 0),
        ];
        sleep(Duration::from_millis(30));

        let values: Vec<i32> = ValueIter::new(EntryIter::new(entries)).collect();
        assert_eq!(values, vec![2, 3]);
    }

    #[test]
    fn test_iter_rechecks_expiry_lazily() {
        let entries = vec![
            CacheEntry::new("a", 1, 0),
            CacheEntry::new("b", 2, 0),
            CacheEntry::new("c", 3, 40),
        ];
        let mut iter = EntryIter::new(entries);

        // Taking "a" buffers "b"; "c" is only checked on the following step
        assert_eq!(*iter.try_next().unwrap().key(), "a");
        sleep(Duration::from_millis(60));

        assert_eq!(*iter.try_next().unwrap().key(), "b");
        assert!(!iter.has_next());
    }

    #[test]
    fn test_try_next_exhausted() {
        let mut iter: EntryIter<&str, i32> = EntryIter::new(Vec::new());

        assert!(!iter.has_next());
        assert_eq!(iter.try_next().unwrap_err(), CacheError::IteratorExhausted);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_remove_is_unsupported() {
        let mut iter = EntryIter::new(vec![CacheEntry::new("a", 1, 0)]);
        assert!(matches!(iter.remove(), Err(CacheError::UnsupportedOperation(_))));

        let mut values = ValueIter::new(EntryIter::new(vec![CacheEntry::new("a", 1, 0)]));
        assert!(matches!(values.remove(), Err(CacheError::UnsupportedOperation(_))));
        assert_eq!(values.try_next().unwrap(), 1);
        assert_eq!(values.try_next().unwrap_err(), CacheError::IteratorExhausted);
    }
}
