// axiom-storage/src/cache.rs
//
// A bounded, time-limited membership cache. Used by `axiom-network`'s
// gossip layer for duplicate-broadcast suppression (§4.D: "by `(type,
// block.hash)` with a 10-minute LRU cache of size 4096"), generalized here
// to any hashable key so it isn't tied to the gossip crate's message types.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash as StdHash;
use std::time::{Duration, Instant};

/// Fixed-capacity cache with insertion-order eviction and a per-entry TTL.
/// Capacity eviction and TTL expiry are both enforced lazily, on `insert`
/// and `contains`, to avoid a background sweeper task.
pub struct LruCache<K> {
    capacity: usize,
    ttl: Duration,
    order: VecDeque<K>,
    entries: HashMap<K, Instant>,
}

impl<K: StdHash + Eq + Clone> LruCache<K> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self { capacity, ttl, order: VecDeque::with_capacity(capacity), entries: HashMap::with_capacity(capacity) }
    }

    fn evict_expired(&mut self) {
        let now = Instant::now();
        while let Some(front) = self.order.front() {
            match self.entries.get(front) {
                Some(inserted_at) if now.duration_since(*inserted_at) > self.ttl => {
                    let key = self.order.pop_front().unwrap();
                    self.entries.remove(&key);
                }
                _ => break,
            }
        }
    }

    /// Insert `key`, returning `true` if it was already present (and thus a
    /// duplicate the caller should suppress).
    pub fn insert(&mut self, key: K) -> bool {
        self.evict_expired();
        if self.entries.contains_key(&key) {
            return true;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
        self.entries.insert(key.clone(), Instant::now());
        self.order.push_back(key);
        false
    }

    pub fn contains(&mut self, key: &K) -> bool {
        self.evict_expired();
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_duplicates() {
        let mut cache: LruCache<u32> = LruCache::new(4, Duration::from_secs(600));
        assert!(!cache.insert(1));
        assert!(cache.insert(1));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut cache: LruCache<u32> = LruCache::new(2, Duration::from_secs(600));
        cache.insert(1);
        cache.insert(2);
        cache.insert(3);
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn ttl_expires_entries() {
        let mut cache: LruCache<u32> = LruCache::new(4, Duration::from_millis(10));
        cache.insert(1);
        std::thread::sleep(Duration::from_millis(30));
        assert!(!cache.contains(&1));
    }
}
