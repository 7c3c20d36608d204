//! Linked Order Module
//!
//! Tracks key ordering for insertion-ordered and recency-ordered containers.

use std::collections::HashMap;
use std::hash::Hash;

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<K> {
    key: Option<K>,
    prev: usize,
    next: usize,
}

// == Linked Order ==
/// Doubly-linked ordering of keys with O(1) touch, remove and eviction.
///
/// Nodes live in a slab indexed by a hash table:
/// - Front = oldest (next eviction candidate)
/// - Back = newest (most recently inserted or touched)
#[derive(Debug)]
pub struct LinkedOrder<K> {
    nodes: Vec<Node<K>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: usize,
    tail: usize,
}

impl<K: Hash + Eq + Clone> LinkedOrder<K> {
    // == Constructor ==
    /// Creates a new empty ordering.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
        }
    }

    // == Push Back ==
    /// Appends a key at the back if it is not tracked yet.
    ///
    /// An already tracked key keeps its position, which gives insertion order.
    pub fn push_back(&mut self, key: &K) {
        if !self.index.contains_key(key) {
            let idx = self.alloc(key.clone());
            self.link_back(idx);
            self.index.insert(key.clone(), idx);
        }
    }

    // == Touch ==
    /// Marks a key as most recently used (moves it to the back).
    ///
    /// If the key is new, it is appended.
    pub fn touch(&mut self, key: &K) {
        match self.index.get(key) {
            Some(&idx) => {
                if idx != self.tail {
                    self.unlink(idx);
                    self.link_back(idx);
                }
            }
            None => self.push_back(key),
        }
    }

    // == Remove ==
    /// Removes a key from the ordering. Returns whether it was tracked.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(idx) => {
                self.unlink(idx);
                self.release(idx);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the oldest key.
    ///
    /// Returns None if the ordering is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        if self.head == NIL {
            return None;
        }
        let idx = self.head;
        self.unlink(idx);
        let key = self.nodes[idx].key.take();
        self.free.push(idx);
        if let Some(key) = &key {
            self.index.remove(key);
        }
        key
    }

    // == Peek Oldest ==
    /// Returns the oldest key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        if self.head == NIL {
            None
        } else {
            self.nodes[self.head].key.as_ref()
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Iterates keys from oldest to newest.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    fn alloc(&mut self, key: K) -> usize {
        let node = Node {
            key: Some(key),
            prev: NIL,
            next: NIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) {
        self.nodes[idx].key = None;
        self.free.push(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn link_back(&mut self, idx: usize) {
        self.nodes[idx].prev = self.tail;
        self.nodes[idx].next = NIL;
        if self.tail == NIL {
            self.head = idx;
        } else {
            self.nodes[self.tail].next = idx;
        }
        self.tail = idx;
    }
}

impl<K: Hash + Eq + Clone> Default for LinkedOrder<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Oldest-to-newest key iterator over a [`LinkedOrder`].
pub struct Iter<'a, K> {
    nodes: &'a [Node<K>],
    cursor: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = &self.nodes[self.cursor];
        self.cursor = node.next;
        node.key.as_ref()
    }
}
