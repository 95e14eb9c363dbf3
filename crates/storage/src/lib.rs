//! Coverage Storage
//!
//! In-memory cache tiers and request deduplication for the coverage
//! aggregator. Nothing here is persisted; every structure is safe to share
//! across concurrently running queries.

pub mod in_flight;
pub mod result_cache;
pub mod ttl_cache;

pub use in_flight::InFlight;
pub use result_cache::{CacheStats, ProviderCacheKey, ResultCache, TierStats};
pub use ttl_cache::TtlCache;
