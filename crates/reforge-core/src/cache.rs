//! Generation cache: deterministic keys, bounded LRU reuse.
//!
//! Within one generation run, two target files that resolve to the same
//! (file path, retrieved context) pair must produce identical output from
//! exactly one generator call. The cache key is a SHA-256 over both
//! inputs, so a hit is only possible when the generator would have seen
//! byte-identical input.
//!
//! Capacity is bounded with least-recently-used eviction so a long-lived
//! process can keep a cache across many runs without unbounded growth.

use std::collections::{HashMap, VecDeque};

use sha2::{Digest, Sha256};

/// Compute the deterministic cache key for a target file and its
/// retrieved context.
pub fn cache_key(file_path: &str, context: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(context.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Bounded LRU map from cache key to previously generated artifact text.
pub struct GenerationCache {
    capacity: usize,
    entries: HashMap<String, String>,
    /// Keys in recency order, least recent at the front.
    order: VecDeque<String>,
}

impl GenerationCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of 0 is clamped to 1 so `insert` always succeeds.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Look up a key, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<String> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get(key).cloned()
    }

    /// Insert a key, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: String, value: String) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), value);
            self.touch(&key);
            return;
        }
        while self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
            self.order.push_back(key.to_string());
        }
    }
}
