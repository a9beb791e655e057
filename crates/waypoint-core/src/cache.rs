//! Bounded LRU cache
//!
//! Wraps [`lru::LruCache`] with hit/miss/eviction accounting and a
//! `resize` that only evicts when shrinking.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;
use xxhash_rust::xxh3::xxh3_64;

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Generic bounded key-value store with least-recently-used eviction
///
/// # Example
/// ```
/// use waypoint_core::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.get(&"a");      // promotes "a"
/// cache.set("c", 3);    // evicts "b"
/// assert!(cache.get(&"b").is_none());
/// assert_eq!(cache.get(&"a"), Some(&1));
/// ```
#[derive(Debug)]
pub struct LruCache<K: Hash + Eq, V> {
    inner: lru::LruCache<K, V>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

fn non_zero(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Create a cache; a zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: lru::LruCache::new(non_zero(capacity)),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up a key, promoting it to most-recently-used on a hit
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.inner.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up a key without promoting it or touching the counters
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.peek(key)
    }

    /// Insert or replace a value, evicting the least-recently-used entry
    /// if the cache is full. Returns the evicted entry.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.inner.contains(&key) {
            self.inner.put(key, value);
            return None;
        }
        let evicted = self.inner.push(key, value);
        if evicted.is_some() {
            self.evictions += 1;
        }
        evicted
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.pop(key)
    }

    /// Change capacity. Shrinking evicts oldest entries; growing never evicts.
    pub fn resize(&mut self, capacity: usize) {
        let before = self.inner.len();
        self.inner.resize(non_zero(capacity));
        self.evictions += (before - self.inner.len()) as u64;
    }

    /// Drop every entry; counters are kept.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            len: self.inner.len(),
            capacity: self.capacity(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

/// Cache key for a lookup.
///
/// The bare path when there is no query; otherwise the path followed by an
/// order-independent xxh3 fingerprint of the sorted query pairs.
///
/// ```
/// use waypoint_core::cache_key;
///
/// let a = vec![("x".to_string(), "1".to_string()), ("y".to_string(), "2".to_string())];
/// let b = vec![("y".to_string(), "2".to_string()), ("x".to_string(), "1".to_string())];
/// assert_eq!(cache_key("/p", &[]), "/p");
/// assert_eq!(cache_key("/p", &a), cache_key("/p", &b));
/// ```
pub fn cache_key(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }

    let mut pairs: Vec<&(String, String)> = query.iter().collect();
    pairs.sort();

    let mut buf = Vec::with_capacity(64);
    for (k, v) in pairs {
        buf.extend_from_slice(k.as_bytes());
        buf.push(0);
        buf.extend_from_slice(v.as_bytes());
        buf.push(0xff);
    }
    format!("{}?#{:016x}", path, xxh3_64(&buf))
}
