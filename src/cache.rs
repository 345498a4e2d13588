//! Bounded, internally-synchronized asset caches.
//!
//! Entries are owned by the cache and handed out as shared references.
//! Eviction can happen between any two calls, so a `get` miss means
//! re-resolve, never an error. All synchronization lives inside the cache;
//! callers never coordinate.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::video::VideoHandle;

struct CacheEntry<V> {
    value: Arc<V>,
    touched: u64,
    weight: usize,
}

/// Thread-safe cache with recency-based eviction.
///
/// Bounded either by entry count (strict LRU: inserting past capacity evicts
/// the least-recently-touched entry) or by an approximate weight budget.
/// A `get` counts as a touch.
pub struct RecencyCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: AtomicU64,
    max_entries: Option<usize>,
    max_weight: Option<usize>,
}

impl<V> RecencyCache<V> {
    /// Create a cache holding at most `max_entries` values.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            clock: AtomicU64::new(0),
            max_entries: Some(max_entries),
            max_weight: None,
        }
    }

    /// Create a cache bounded by an approximate weight budget instead of an
    /// entry count.
    pub fn with_weight_budget(max_weight: usize) -> Self {
        Self {
            entries: DashMap::new(),
            clock: AtomicU64::new(0),
            max_entries: None,
            max_weight: Some(max_weight),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Fetch a value, refreshing its recency.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let tick = self.tick();
        self.entries.get_mut(key).map(|mut entry| {
            entry.touched = tick;
            Arc::clone(&entry.value)
        })
    }

    /// Insert a value with unit weight.
    pub fn insert(&self, key: impl Into<String>, value: Arc<V>) {
        self.insert_weighted(key, value, 1);
    }

    /// Insert a value with an explicit weight (approximate byte cost).
    pub fn insert_weighted(&self, key: impl Into<String>, value: Arc<V>, weight: usize) {
        let tick = self.tick();
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                touched: tick,
                weight,
            },
        );
        self.evict_over_limit();
    }

    /// Remove an entry.
    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Whether an entry is present, without touching it.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    fn total_weight(&self) -> usize {
        self.entries.iter().map(|e| e.weight).sum()
    }

    fn evict_over_limit(&self) {
        if let Some(max) = self.max_entries {
            while self.entries.len() > max {
                if !self.evict_least_recent() {
                    break;
                }
            }
        }
        if let Some(budget) = self.max_weight {
            while self.total_weight() > budget && self.entries.len() > 1 {
                if !self.evict_least_recent() {
                    break;
                }
            }
        }
    }

    fn evict_least_recent(&self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.touched)
            .map(|entry| entry.key().clone());

        match victim {
            Some(key) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }
}

/// Decoded-image cache keyed by selection id.
///
/// Unbounded in count; an approximate byte budget stands in for
/// memory-pressure eviction, so any entry may be dropped between calls.
pub type ImageCache = RecencyCache<image::DynamicImage>;

/// Opened-video-handle cache keyed by source URL. Hard capacity, strict LRU.
pub type VideoCache = RecencyCache<VideoHandle>;

/// Hard capacity of the video handle cache.
pub const VIDEO_CACHE_CAPACITY: usize = 5;

/// Approximate in-memory weight of a decoded image.
pub fn image_weight(img: &image::DynamicImage) -> usize {
    img.width() as usize * img.height() as usize * 4
}
