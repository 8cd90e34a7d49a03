//! Asset cache for the live renderer.
//!
//! Holds decoded assets keyed by their source reference so repeated frames
//! never refetch or redecode. Eviction is least-recently-used, bounded by
//! total bytes, entry count and idle age.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::asset::LoadedAsset;

#[derive(Debug)]
struct CacheEntry {
    asset: LoadedAsset,
    last_accessed: Instant,
    size_bytes: usize,
}

/// Configuration for the asset cache.
#[derive(Debug, Clone)]
pub struct AssetCacheConfig {
    /// Maximum cache size in bytes.
    pub max_size_bytes: usize,
    /// Maximum age before eviction (if not accessed).
    pub max_age: Duration,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for AssetCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 64 * 1024 * 1024, // 64 MB
            max_age: Duration::from_secs(300), // 5 minutes
            max_entries: 256,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
    /// Total bytes inserted.
    pub bytes_loaded: u64,
}

/// LRU cache of decoded assets.
#[derive(Debug)]
pub struct AssetCache {
    entries: HashMap<String, CacheEntry>,
    config: AssetCacheConfig,
    current_size: usize,
    stats: CacheStats,
}

impl AssetCache {
    /// Create a cache with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AssetCacheConfig::default())
    }

    /// Create a cache with custom limits.
    #[must_use]
    pub fn with_config(config: AssetCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            current_size: 0,
            stats: CacheStats::default(),
        }
    }

    /// Get an asset and mark it as recently used.
    pub fn get(&mut self, key: &str) -> Option<&LoadedAsset> {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_accessed = Instant::now();
            self.stats.hits += 1;
            Some(&entry.asset)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Mark an asset as recently used without counting a hit.
    ///
    /// Returns whether the asset is cached.
    pub fn touch(&mut self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_accessed = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Get an asset without touching recency or statistics.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<&LoadedAsset> {
        self.entries.get(key).map(|entry| &entry.asset)
    }

    /// Insert an asset, evicting older entries if limits are exceeded.
    ///
    /// An asset larger than the whole cache is not stored.
    pub fn insert(&mut self, key: String, asset: LoadedAsset) {
        let size_bytes = asset.size_bytes();
        if size_bytes > self.config.max_size_bytes {
            tracing::warn!("Asset {key} ({size_bytes} bytes) exceeds cache capacity, not cached");
            return;
        }

        if let Some(old) = self.entries.remove(&key) {
            self.current_size -= old.size_bytes;
        }

        self.evict_if_needed(size_bytes);

        self.current_size += size_bytes;
        self.stats.bytes_loaded += size_bytes as u64;
        self.entries.insert(
            key,
            CacheEntry {
                asset,
                last_accessed: Instant::now(),
                size_bytes,
            },
        );
    }

    /// Remove an asset.
    pub fn remove(&mut self, key: &str) -> Option<LoadedAsset> {
        let entry = self.entries.remove(key)?;
        self.current_size -= entry.size_bytes;
        Some(entry.asset)
    }

    /// Check if an asset is cached.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Clear all cached assets.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
    }

    /// Number of cached assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current cache size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.current_size
    }

    /// Cache statistics.
    #[must_use]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn evict_if_needed(&mut self, needed_bytes: usize) {
        while self.current_size + needed_bytes > self.config.max_size_bytes
            && !self.entries.is_empty()
        {
            self.evict_lru();
        }

        while self.entries.len() >= self.config.max_entries && !self.entries.is_empty() {
            self.evict_lru();
        }

        self.evict_expired();
    }

    fn evict_lru(&mut self) {
        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest_key {
            if let Some(entry) = self.entries.remove(&key) {
                self.current_size -= entry.size_bytes;
                self.stats.evictions += 1;
                tracing::trace!("Evicted asset {key}");
            }
        }
    }

    fn evict_expired(&mut self) {
        let now = Instant::now();
        let max_age = self.config.max_age;
        let before = self.entries.len();
        let mut freed = 0;

        self.entries.retain(|_, entry| {
            let keep = now.duration_since(entry.last_accessed) <= max_age;
            if !keep {
                freed += entry.size_bytes;
            }
            keep
        });

        self.current_size -= freed;
        self.stats.evictions += (before - self.entries.len()) as u64;
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetFormat;

    fn asset(len: usize) -> LoadedAsset {
        LoadedAsset {
            format: AssetFormat::Png,
            width: 1,
            height: 1,
            data_uri: "x".repeat(len),
        }
    }

    #[test]
    fn test_hits_and_misses() {
        let mut cache = AssetCache::new();
        assert!(cache.get("a").is_none());
        cache.insert("a".into(), asset(10));
        assert!(cache.get("a").is_some());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.size_bytes(), 10);
    }

    #[test]
    fn test_size_limit_evicts_least_recent() {
        let mut cache = AssetCache::with_config(AssetCacheConfig {
            max_size_bytes: 25,
            ..AssetCacheConfig::default()
        });
        cache.insert("a".into(), asset(10));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("b".into(), asset(10));
        std::thread::sleep(Duration::from_millis(2));
        cache.get("a");
        cache.insert("c".into(), asset(10));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_touch_keeps_entry_from_expiring() {
        let mut cache = AssetCache::with_config(AssetCacheConfig {
            max_age: Duration::from_millis(60),
            ..AssetCacheConfig::default()
        });
        cache.insert("a".into(), asset(1));
        for _ in 0..4 {
            std::thread::sleep(Duration::from_millis(25));
            assert!(cache.touch("a"));
        }
        cache.insert("b".into(), asset(1));
        assert!(cache.contains("a"));
        assert_eq!(cache.stats().hits, 0);
        assert!(!cache.touch("missing"));
    }

    #[test]
    fn test_entry_limit_and_oversize() {
        let mut cache = AssetCache::with_config(AssetCacheConfig {
            max_entries: 1,
            max_size_bytes: 100,
            ..AssetCacheConfig::default()
        });
        cache.insert("a".into(), asset(1));
        cache.insert("b".into(), asset(1));
        assert_eq!(cache.len(), 1);

        cache.insert("huge".into(), asset(1000));
        assert!(!cache.contains("huge"));
    }

    #[test]
    fn test_reinsert_replaces_size() {
        let mut cache = AssetCache::new();
        cache.insert("a".into(), asset(10));
        cache.insert("a".into(), asset(4));
        assert_eq!(cache.size_bytes(), 4);
        assert_eq!(cache.remove("a").map(|a| a.data_uri.len()), Some(4));
        assert!(cache.is_empty());
    }
}
