//! In-memory response cache with per-entry expiry
//!
//! Entries are keyed by [`CacheKey`] and carry their own expiry time, so a
//! caller may store some responses with a shorter or longer TTL than the
//! default. Reads never return an entry at or past its expiry; such entries
//! are dropped on the spot.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::key::{CacheKey, KeyPattern, RequestOptions};

/// Default lifetime of a cached response
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Entry count above which a store triggers a sweep
pub const DEFAULT_HIGH_WATER_MARK: usize = 256;

/// Cached response body. Shared so hits don't copy large lists.
pub type Payload = Arc<serde_json::Value>;

/// Configuration for the response cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL used by [`ResponseCache::set`]
    pub default_ttl: Duration,
    /// Store count that triggers [`ResponseCache::cleanup`]
    pub high_water_mark: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            default_ttl: ttl,
            ..Self::default()
        }
    }
}

/// A stored response
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// An entry is served strictly before its expiry instant
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Counters and size of a cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because they expired or the cache was over its mark
    pub evictions: u64,
    /// Entries dropped by delete, pattern invalidation or clear
    pub invalidations: u64,
}

impl CacheStats {
    /// Share of lookups served from the cache, 0.0 when there were none
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    invalidations: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: usize) {
        counter.fetch_add(by as u64, Ordering::Relaxed);
    }
}

/// TTL cache for REST read responses.
///
/// Constructed explicitly and handed to whoever needs it; there is no global
/// instance. All operations are safe to call from several tasks at once.
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResponseCache {
    /// Create a cache reading the system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            clock,
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Look up a response by URL and options
    pub fn get(&self, url: &str, options: &RequestOptions) -> Option<Payload> {
        self.get_key(&CacheKey::new(url, options))
    }

    /// Look up a response by key. Expired entries are removed and reported as a miss.
    pub fn get_key(&self, key: &CacheKey) -> Option<Payload> {
        let now = self.clock.now();

        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => {
                    Counters::bump(&self.counters.hits, 1);
                    tracing::debug!(key = %key, "cache hit");
                    return Some(entry.payload.clone());
                }
                None => {
                    Counters::bump(&self.counters.misses, 1);
                    tracing::debug!(key = %key, "cache miss");
                    return None;
                }
                Some(_) => {}
            }
        }

        // Expired under the read lock; re-check under the write lock since a
        // concurrent store may have refreshed it in between.
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                Counters::bump(&self.counters.hits, 1);
                tracing::debug!(key = %key, "cache hit");
                Some(entry.payload.clone())
            }
            Some(_) => {
                entries.remove(key);
                Counters::bump(&self.counters.evictions, 1);
                Counters::bump(&self.counters.misses, 1);
                tracing::debug!(key = %key, "cache entry expired");
                None
            }
            None => {
                Counters::bump(&self.counters.misses, 1);
                tracing::debug!(key = %key, "cache miss");
                None
            }
        }
    }

    /// Store a response with the default TTL
    pub fn set(&self, url: &str, options: &RequestOptions, payload: Payload) {
        self.set_key(CacheKey::new(url, options), payload, self.config.default_ttl);
    }

    /// Store a response with an explicit TTL. A zero TTL stores nothing.
    pub fn set_with_ttl(&self, url: &str, options: &RequestOptions, payload: Payload, ttl: Duration) {
        self.set_key(CacheKey::new(url, options), payload, ttl);
    }

    /// Store a response under a prepared key, replacing any previous entry
    pub fn set_key(&self, key: CacheKey, payload: Payload, ttl: Duration) {
        if ttl.is_zero() {
            tracing::trace!(key = %key, "zero ttl, not caching");
            return;
        }

        let created_at = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "caching response");

        let stored = key.clone();
        let len = {
            let mut entries = self.entries.write();
            entries.insert(
                key.clone(),
                CacheEntry {
                    key,
                    payload,
                    created_at,
                    expires_at,
                },
            );
            entries.len()
        };

        if len > self.config.high_water_mark {
            self.cleanup();
            self.shrink_to_mark(&stored);
        }
    }

    /// Remove the entry for a URL and options. Returns whether one existed.
    pub fn delete(&self, url: &str, options: &RequestOptions) -> bool {
        self.delete_key(&CacheKey::new(url, options))
    }

    pub fn delete_key(&self, key: &CacheKey) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            Counters::bump(&self.counters.invalidations, 1);
            tracing::debug!(key = %key, "cache entry deleted");
        }
        removed
    }

    /// Remove every entry whose path matches the pattern. Returns the count removed.
    pub fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !pattern.matches(key));
        let removed = before - entries.len();
        drop(entries);

        Counters::bump(&self.counters.invalidations, removed);
        tracing::debug!(pattern = ?pattern, removed, "invalidated cache entries");
        removed
    }

    /// Remove everything
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        drop(entries);

        Counters::bump(&self.counters.invalidations, removed);
        tracing::debug!(removed, "cache cleared");
    }

    /// Drop every expired entry. Returns the count removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            Counters::bump(&self.counters.evictions, removed);
            tracing::debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Evict the entries closest to expiry until the count is at the mark.
    /// `keep` is the entry just stored and is never chosen.
    fn shrink_to_mark(&self, keep: &CacheKey) {
        let mut entries = self.entries.write();
        let excess = entries.len().saturating_sub(self.config.high_water_mark);
        if excess == 0 {
            return;
        }

        let mut by_expiry: Vec<(DateTime<Utc>, CacheKey)> = entries
            .values()
            .filter(|entry| &entry.key != keep)
            .map(|entry| (entry.expires_at, entry.key.clone()))
            .collect();
        by_expiry.sort_by(|a, b| a.0.cmp(&b.0));

        let mut evicted = 0;
        for (_, key) in by_expiry.into_iter().take(excess) {
            entries.remove(&key);
            evicted += 1;
        }
        drop(entries);

        Counters::bump(&self.counters.evictions, evicted);
        tracing::debug!(evicted, "cache over high-water mark");
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe handle for sharing a ResponseCache
pub type SharedResponseCache = Arc<ResponseCache>;

pub fn new_shared_cache(config: CacheConfig) -> SharedResponseCache {
    Arc::new(ResponseCache::new(config))
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
