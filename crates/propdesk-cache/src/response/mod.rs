//! TTL cache for read responses

mod cache;

pub use cache::{
    CacheConfig, CacheEntry, CacheStats, DEFAULT_HIGH_WATER_MARK, DEFAULT_TTL, Payload,
    ResponseCache, SharedResponseCache, new_shared_cache,
};
