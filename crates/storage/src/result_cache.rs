//! Two-tier coverage result cache
//!
//! The per-provider tier holds individual provider answers for a long TTL;
//! the aggregate tier holds whole combined answers for a short one. Both
//! are keyed on rounded coordinates so that near-identical lookups share
//! entries.
//!
//! Every [`ResultCache::clear`] starts a new generation. Writers that
//! captured an older generation before dispatching are refused, so answers
//! computed before a clear never reappear after it.

use coverage_types::{AggregatedResult, ProviderResult, RoundedCoordinate, Technology};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::debug;

use crate::ttl_cache::TtlCache;

/// Key of the per-provider tier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderCacheKey {
	pub provider: String,
	/// Discriminates providers that answer per technology
	pub technology: Option<Technology>,
	pub coordinate: RoundedCoordinate,
}

impl ProviderCacheKey {
	pub fn new(
		provider: impl Into<String>,
		technology: Option<Technology>,
		coordinate: RoundedCoordinate,
	) -> Self {
		Self {
			provider: provider.into(),
			technology,
			coordinate,
		}
	}
}

/// Counters for one tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStats {
	pub entries: usize,
	pub hits: u64,
	pub misses: u64,
	/// 0.0 when there were no lookups
	pub hit_ratio: f64,
}

/// Snapshot of both tiers plus pending dispatches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
	pub provider: TierStats,
	pub aggregate: TierStats,
	pub in_flight: usize,
}

#[derive(Debug, Default)]
struct Counters {
	hits: AtomicU64,
	misses: AtomicU64,
}

impl Counters {
	fn record(&self, hit: bool) {
		if hit {
			self.hits.fetch_add(1, Ordering::Relaxed);
		} else {
			self.misses.fetch_add(1, Ordering::Relaxed);
		}
	}

	fn snapshot(&self, entries: usize) -> TierStats {
		let hits = self.hits.load(Ordering::Relaxed);
		let misses = self.misses.load(Ordering::Relaxed);
		let lookups = hits + misses;
		TierStats {
			entries,
			hits,
			misses,
			hit_ratio: if lookups > 0 {
				hits as f64 / lookups as f64
			} else {
				0.0
			},
		}
	}
}

#[derive(Debug, Clone)]
pub struct ResultCache {
	provider: TtlCache<ProviderCacheKey, ProviderResult>,
	aggregate: TtlCache<RoundedCoordinate, AggregatedResult>,
	provider_counters: Arc<Counters>,
	aggregate_counters: Arc<Counters>,
	generation: Arc<AtomicU64>,
}

impl ResultCache {
	pub fn new(provider_ttl: Duration, aggregate_ttl: Duration) -> Self {
		Self {
			provider: TtlCache::new(provider_ttl),
			aggregate: TtlCache::new(aggregate_ttl),
			provider_counters: Arc::new(Counters::default()),
			aggregate_counters: Arc::new(Counters::default()),
			generation: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Current generation, to be passed back to the `*_if_current` writers
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::SeqCst)
	}

	fn is_current(&self, generation: u64) -> bool {
		self.generation() == generation
	}

	pub fn get_provider(&self, key: &ProviderCacheKey) -> Option<Arc<ProviderResult>> {
		let cached = self.provider.get(key);
		self.provider_counters.record(cached.is_some());
		if cached.is_some() {
			debug!(
				"Provider cache hit for {} at {}",
				key.provider, key.coordinate
			);
		}
		cached
	}

	pub fn put_provider(&self, key: ProviderCacheKey, result: ProviderResult) {
		self.provider.insert(key, result);
	}

	/// Store a provider answer unless the cache was cleared since `generation`
	pub fn put_provider_if_current(
		&self,
		generation: u64,
		key: ProviderCacheKey,
		result: ProviderResult,
	) -> bool {
		if !self.is_current(generation) {
			return false;
		}
		self.provider.insert(key.clone(), result);
		// A clear that raced the insert must still win
		if !self.is_current(generation) {
			self.provider.remove(&key);
			return false;
		}
		true
	}

	pub fn get_aggregate(&self, key: &RoundedCoordinate) -> Option<Arc<AggregatedResult>> {
		let cached = self.aggregate.get(key);
		self.aggregate_counters.record(cached.is_some());
		if cached.is_some() {
			debug!("Aggregate cache hit for {}", key);
		}
		cached
	}

	/// Aggregate lookup that does not count towards hit/miss statistics
	pub fn peek_aggregate(&self, key: &RoundedCoordinate) -> Option<Arc<AggregatedResult>> {
		self.aggregate.get(key)
	}

	pub fn put_aggregate(&self, key: RoundedCoordinate, result: Arc<AggregatedResult>) {
		self.aggregate.insert_arc(key, result);
	}

	/// Store an aggregate answer unless the cache was cleared since `generation`
	pub fn put_aggregate_if_current(
		&self,
		generation: u64,
		key: RoundedCoordinate,
		result: Arc<AggregatedResult>,
	) -> bool {
		if !self.is_current(generation) {
			debug!("Dropping aggregate for {} computed before a cache clear", key);
			return false;
		}
		self.aggregate.insert_arc(key, result);
		if !self.is_current(generation) {
			self.aggregate.remove(&key);
			return false;
		}
		true
	}

	/// Drop every entry from both tiers and start a new generation;
	/// counters are kept
	pub fn clear(&self) {
		self.generation.fetch_add(1, Ordering::SeqCst);
		let provider = self.provider.len();
		let aggregate = self.aggregate.len();
		self.provider.clear();
		self.aggregate.clear();
		debug!(
			"Cleared {} provider and {} aggregate cache entries",
			provider, aggregate
		);
	}

	/// Evict expired entries from both tiers, returning how many were removed
	pub fn purge_expired(&self) -> usize {
		let removed = self.provider.purge_expired() + self.aggregate.purge_expired();
		if removed > 0 {
			debug!("Evicted {} expired cache entries", removed);
		}
		removed
	}

	pub fn stats(&self, in_flight: usize) -> CacheStats {
		CacheStats {
			provider: self.provider_counters.snapshot(self.provider.len()),
			aggregate: self.aggregate_counters.snapshot(self.aggregate.len()),
			in_flight,
		}
	}

	pub fn provider_ttl(&self) -> Duration {
		self.provider.ttl()
	}

	pub fn aggregate_ttl(&self) -> Duration {
		self.aggregate.ttl()
	}
}
