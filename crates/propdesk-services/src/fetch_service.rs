//! Read-through fetch wrapper
//!
//! Reads go through the response cache (cache-aside): a live entry is
//! returned without touching the network, a miss fetches, stores and
//! returns. Writes always hit the network and, on success, invalidate the
//! cache entries declared for the written resource.

use parking_lot::Mutex;
use propdesk_cache::{CacheKey, KeyPattern, Payload, RequestOptions, SharedResponseCache};
use propdesk_core::{Record, ResourceKind, records_from_payload};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::transport::{HttpMethod, Transport};

/// Aggregate endpoint that summarizes every resource
pub const DASHBOARD_SUMMARY_PATH: &str = "/v1/dashboard/summary/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Serialize concurrent misses of one key so only one request is made
    pub coalesce_misses: bool,
    /// Overrides the cache's default TTL for responses stored by this service
    pub ttl: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            coalesce_misses: true,
            ttl: None,
        }
    }
}

/// Which cache entries a successful write to a resource makes stale
#[derive(Debug, Clone, Default)]
pub struct InvalidationMap {
    rules: HashMap<ResourceKind, Vec<KeyPattern>>,
}

impl InvalidationMap {
    /// An empty map; every write falls back to its URL's collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Every resource invalidates its own collection and the dashboard summary
    pub fn standard() -> Self {
        ResourceKind::all()
            .iter()
            .fold(Self::new(), |map, &kind| {
                let mut patterns = vec![KeyPattern::collection(kind)];
                if kind != ResourceKind::Dashboard {
                    patterns.push(KeyPattern::Exact(DASHBOARD_SUMMARY_PATH.to_string()));
                }
                map.with_rule(kind, patterns)
            })
    }

    pub fn with_rule(mut self, kind: ResourceKind, patterns: Vec<KeyPattern>) -> Self {
        self.rules.insert(kind, patterns);
        self
    }

    pub fn patterns_for(&self, kind: ResourceKind) -> Option<&[KeyPattern]> {
        self.rules
            .get(&kind)
            .map(Vec::as_slice)
            .filter(|patterns| !patterns.is_empty())
    }
}

/// Collection a URL belongs to: the known resource's collection, or the
/// URL's parent path
fn collection_prefix(url: &str) -> KeyPattern {
    if let Some(kind) = ResourceKind::from_path(url) {
        return KeyPattern::collection(kind);
    }
    let path = url.split('?').next().unwrap_or(url);
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let parent = match trimmed.rfind('/') {
        Some(ix) => &trimmed[..=ix],
        None => "/",
    };
    KeyPattern::Prefix(parent.to_string())
}

type InflightLocks = Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>;

/// Cache-aside access to the REST API
pub struct FetchService {
    transport: Arc<dyn Transport>,
    cache: SharedResponseCache,
    invalidation: InvalidationMap,
    config: FetchConfig,
    inflight: InflightLocks,
}

impl std::fmt::Debug for FetchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchService")
            .field("config", &self.config)
            .field("cached_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl FetchService {
    pub fn new(transport: Arc<dyn Transport>, cache: SharedResponseCache) -> Self {
        Self {
            transport,
            cache,
            invalidation: InvalidationMap::standard(),
            config: FetchConfig::default(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_invalidation(mut self, invalidation: InvalidationMap) -> Self {
        self.invalidation = invalidation;
        self
    }

    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache(&self) -> &SharedResponseCache {
        &self.cache
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Read a payload, from the cache when a live entry exists
    #[tracing::instrument(skip(self, options), fields(url = %url))]
    pub async fn read(&self, url: &str, options: &RequestOptions) -> FetchResult<Payload> {
        let key = CacheKey::new(url, options);
        if let Some(payload) = self.cache.get_key(&key) {
            tracing::debug!("cache hit");
            return Ok(payload);
        }

        if !self.config.coalesce_misses {
            return self.fetch_and_store(key, url, options).await;
        }

        let slot = InflightSlot::acquire(&self.inflight, &key);
        let _guard = slot.lock.lock().await;
        // Another caller may have filled the entry while we waited
        match self.cache.get_key(&key) {
            Some(payload) => {
                tracing::debug!("served by coalesced request");
                Ok(payload)
            }
            None => self.fetch_and_store(key.clone(), url, options).await,
        }
    }

    /// Read a list endpoint and decode it into records
    pub async fn read_records(
        &self,
        url: &str,
        options: &RequestOptions,
        id_field: &str,
    ) -> FetchResult<Vec<Record>> {
        let payload = self.read(url, options).await?;
        Ok(records_from_payload(&payload, id_field)?)
    }

    /// Send a write. On success the cache entries declared for `resource`
    /// are invalidated; without a declared rule the URL's collection is.
    #[tracing::instrument(skip(self, options, body), fields(method = %method, url = %url))]
    pub async fn write(
        &self,
        method: HttpMethod,
        resource: ResourceKind,
        url: &str,
        options: &RequestOptions,
        body: Option<&serde_json::Value>,
    ) -> FetchResult<serde_json::Value> {
        if !method.is_write() {
            return Err(FetchError::NotAWrite(method));
        }

        let response = self.transport.send(method, url, options, body).await?;
        let removed = self.invalidate(resource, url);
        tracing::info!(resource = resource.label(), removed, "invalidated after write");
        Ok(response)
    }

    /// Invalidate what a write of `resource` at `url` makes stale
    pub fn invalidate(&self, resource: ResourceKind, url: &str) -> usize {
        match self.invalidation.patterns_for(resource) {
            Some(patterns) => patterns
                .iter()
                .map(|pattern| self.cache.invalidate_matching(pattern))
                .sum(),
            None => self.cache.invalidate_matching(&collection_prefix(url)),
        }
    }

    async fn fetch_and_store(
        &self,
        key: CacheKey,
        url: &str,
        options: &RequestOptions,
    ) -> FetchResult<Payload> {
        tracing::debug!("cache miss, fetching");
        match self.transport.get(url, options).await {
            Ok(value) => {
                let payload: Payload = Arc::new(value);
                let ttl = self.config.ttl.unwrap_or(self.cache.config().default_ttl);
                self.cache.set_key(key, payload.clone(), ttl);
                Ok(payload)
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed");
                Err(e)
            }
        }
    }

}

/// A caller's share of a per-key miss lock. The map entry goes away with
/// the last share, including when the read is dropped mid-flight.
struct InflightSlot<'a> {
    inflight: &'a InflightLocks,
    key: CacheKey,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> InflightSlot<'a> {
    fn acquire(inflight: &'a InflightLocks, key: &CacheKey) -> Self {
        let lock = inflight
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        Self {
            inflight,
            key: key.clone(),
            lock,
        }
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock();
        let ours = inflight
            .get(&self.key)
            .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock));
        // One reference in the map plus ours: nobody else is waiting
        if ours && Arc::strong_count(&self.lock) <= 2 {
            inflight.remove(&self.key);
        }
    }
}
