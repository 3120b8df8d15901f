//! Shared cache for repeated words.
//!
//! Many threads read the cache while encoding a batch. Lookups and inserts
//! only ever *try* to take the lock: a contended read counts as a miss and a
//! contended or over-capacity write is dropped, so the cache never blocks
//! encoding.

use ahash::AHashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Default number of entries kept by a cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Bounded, thread-safe cache.
#[derive(Debug)]
pub struct EncodingCache<K, V> {
    map: RwLock<AHashMap<K, V>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> EncodingCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new cache holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: RwLock::new(AHashMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY))),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a new cache with default capacity (10,000).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Look up a cached value.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self
            .map
            .try_read()
            .ok()
            .and_then(|map| map.get(key).cloned());
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a value unless the cache is full or busy.
    pub fn set(&self, key: K, value: V) {
        if let Ok(mut map) = self.map.try_write() {
            if map.len() < self.capacity || map.contains_key(&key) {
                map.insert(key, value);
            }
        }
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        if let Ok(mut map) = self.map.write() {
            map.clear();
        }
    }

    /// Get the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.map.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the cache capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A fresh, empty cache with the same capacity.
    pub fn fresh(&self) -> Self {
        Self::with_capacity(self.capacity)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits,
            misses,
            hit_rate: (lookups > 0).then(|| hits as f64 / lookups as f64),
        }
    }
}

impl<K, V> Default for EncodingCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for EncodingCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // Clones start cold.
    fn clone(&self) -> Self {
        self.fresh()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Current number of entries
    pub entries: usize,
    /// Maximum capacity
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// Cache hit rate (None before the first lookup)
    pub hit_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_miss() {
        let cache: EncodingCache<String, Vec<u32>> = EncodingCache::with_capacity(3);

        assert_eq!(cache.get("hello"), None);
        cache.set("hello".to_string(), vec![1, 2, 3]);
        assert_eq!(cache.get("hello"), Some(vec![1, 2, 3]));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, Some(0.5));
    }

    #[test]
    fn test_full_cache_drops_writes() {
        let cache: EncodingCache<String, u32> = EncodingCache::with_capacity(2);
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        cache.set("c".into(), 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("c"), None);
        // Existing keys can still be refreshed.
        cache.set("a".into(), 10);
        assert_eq!(cache.get("a"), Some(10));
    }

    #[test]
    fn test_clear_and_clone() {
        let cache: EncodingCache<String, u32> = EncodingCache::new();
        cache.set("hello".into(), 1);
        assert_eq!(cache.clone().len(), 0);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_stats_start_empty() {
        let cache: EncodingCache<String, u32> = EncodingCache::with_capacity(100);
        let stats = cache.stats();

        assert_eq!(stats.entries, 0);
        assert_eq!(stats.capacity, 100);
        assert_eq!(stats.hit_rate, None);
    }
}
