//! Response cache for REST reads
//!
//! Read responses are kept in memory keyed by URL plus a canonical form of the
//! request options. Entries expire after a TTL and are evicted lazily on the
//! next read or by an opportunistic sweep once the entry count crosses a
//! high-water mark. There are no timers and no persistence.

mod clock;
mod key;
mod response;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{CacheKey, KeyPattern, RequestOptions};
pub use response::{
    CacheConfig, CacheEntry, CacheStats, DEFAULT_HIGH_WATER_MARK, DEFAULT_TTL, Payload,
    ResponseCache, SharedResponseCache, new_shared_cache,
};
