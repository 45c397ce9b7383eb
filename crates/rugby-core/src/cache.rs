//! Bounded in-memory cache with least-recently-used eviction.
//!
//! The cache has no time-based expiry; it is bounded purely by entry count.
//! It is not synchronized: a single owner mutates it through `&mut self`.

use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

/// Default number of entries kept when no configuration says otherwise.
pub const DEFAULT_MAX_SIZE: usize = 256;

/// Size-bounded key/value store with LRU eviction.
///
/// A `max_size` of zero yields a cache that stores nothing.
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: Option<LruCache<String, V>>,
    max_size: usize,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(max_size).map(LruCache::new),
            max_size,
        }
    }

    /// Looks up a key, promoting it to most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.entries.as_mut()?.get(key).cloned()
    }

    /// Inserts or updates a key, evicting the least recently used entry when full.
    pub fn put(&mut self, key: impl Into<String>, value: V) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        let key = key.into();
        if !entries.contains(&key) && entries.len() == entries.cap().get() {
            if let Some((evicted, _)) = entries.pop_lru() {
                debug!("Evicted least recently used cache key: {}", evicted);
            }
        }
        entries.put(key, value);
    }

    /// Membership test that leaves recency untouched.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.as_ref().map_or(false, |e| e.contains(key))
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
        debug!("Cleared all cache entries");
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut cache = ResponseCache::new(4);
        cache.put("key1", "value1".to_string());

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_put_existing_key_updates_value() {
        let mut cache = ResponseCache::new(2);
        cache.put("key1", 1);
        cache.put("key1", 2);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("key1"), Some(2));
    }

    #[test]
    fn test_overflow_evicts_least_recently_used() {
        let mut cache = ResponseCache::new(3);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.put("d", 4);

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_get_protects_entry_from_next_eviction() {
        let mut cache = ResponseCache::new(3);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(cache.get("a"), Some(1));
        cache.put("d", 4);

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn test_contains_does_not_promote() {
        let mut cache = ResponseCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);

        assert!(cache.contains("a"));
        cache.put("c", 3);

        assert!(!cache.contains("a"));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_update_promotes_entry() {
        let mut cache = ResponseCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 10);
        cache.put("c", 3);

        assert_eq!(cache.get("a"), Some(10));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn test_never_exceeds_max_size() {
        let mut cache = ResponseCache::new(5);
        for i in 0..50 {
            cache.put(format!("key{}", i), i);
            assert!(cache.len() <= 5);
        }
        assert_eq!(cache.len(), 5);
        assert!(cache.contains("key49"));
        assert!(!cache.contains("key44"));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = ResponseCache::new(0);
        cache.put("a", 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.max_size(), 0);
    }

    #[test]
    fn test_clear() {
        let mut cache = ResponseCache::new(4);
        cache.put("key1", 1);
        cache.put("key2", 2);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("key1"), None);
        cache.put("key3", 3);
        assert_eq!(cache.len(), 1);
    }
}
