//! Fan-out/fan-in orchestration of one coverage query

use chrono::Utc;
use coverage_adapters::AdapterRegistry;
use coverage_storage::{CacheStats, InFlight, ResultCache};
use coverage_types::{
	AggregatedResult, CacheLookupPoint, Coordinates, CoverageAdapter, CoverageQuery, GeoBounds,
	GeoError, ProviderResult, RoundedCoordinate,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::aggregator::{aggregate, ProviderOutcome};
use crate::metrics::MetricsCollector;
use crate::provider::ProviderService;

/// Runs coverage queries against every registered adapter
///
/// Lookup order for a query: the aggregate cache, then any identical query
/// already in flight, then a concurrent fan-out to all adapters. Fan-out
/// waits for every adapter (each bounded by its own timeout) and never
/// fails as a whole.
#[derive(Debug, Clone)]
pub struct Dispatcher {
	registry: Arc<AdapterRegistry>,
	providers: ProviderService,
	cache: ResultCache,
	/// Keyed by cache generation too, so queries after a clear never join a
	/// dispatch that started before it
	in_flight: InFlight<(u64, RoundedCoordinate), Arc<AggregatedResult>>,
	metrics: Arc<MetricsCollector>,
	bounds: GeoBounds,
	coordinate_precision: u32,
}

impl Dispatcher {
	pub fn new(
		registry: Arc<AdapterRegistry>,
		providers: ProviderService,
		cache: ResultCache,
		metrics: Arc<MetricsCollector>,
		bounds: GeoBounds,
		coordinate_precision: u32,
	) -> Self {
		Self {
			registry,
			providers,
			cache,
			in_flight: InFlight::new(),
			metrics,
			bounds,
			coordinate_precision,
		}
	}

	pub fn registry(&self) -> &AdapterRegistry {
		&self.registry
	}

	pub fn bounds(&self) -> &GeoBounds {
		&self.bounds
	}

	pub async fn check_coverage(
		&self,
		query: CoverageQuery,
	) -> Result<Arc<AggregatedResult>, GeoError> {
		query.validate(&self.bounds)?;
		let key = query.coordinates().round(self.coordinate_precision);

		let cached = self.cache.get_aggregate(&key);
		self.metrics
			.record_cache_lookup(CacheLookupPoint::new(None, cached.is_some()));
		if let Some(result) = cached {
			return Ok(for_caller(result, query));
		}

		let registry = Arc::clone(&self.registry);
		let providers = self.providers.clone();
		let cache = self.cache.clone();
		let leader_query = query.clone();
		let generation = self.cache.generation();
		let (result, started) = self
			.in_flight
			.run((generation, key), move || async move {
				// A leader that finished between our miss and this point
				if let Some(result) = cache.peek_aggregate(&key) {
					return result;
				}

				let result = Arc::new(fan_out(&registry, &providers, leader_query).await);
				if !cache.put_aggregate_if_current(generation, key, Arc::clone(&result)) {
					debug!("Cache cleared while {} was dispatching; not caching", key);
				}
				result
			})
			.await;

		if !started {
			debug!("Served {} from an in-flight query", key);
		}
		Ok(for_caller(result, query))
	}

	/// Query a single adapter, bypassing aggregation
	///
	/// Returns `Ok(None)` when no adapter is registered under `name`.
	pub async fn check_provider(
		&self,
		name: &str,
		coordinates: Coordinates,
	) -> Result<Option<ProviderResult>, GeoError> {
		self.bounds.validate(&coordinates)?;
		match self.registry.get(name) {
			Some(adapter) => Ok(Some(self.providers.invoke(adapter, coordinates).await)),
			None => Ok(None),
		}
	}

	pub fn cache_stats(&self) -> CacheStats {
		self.cache.stats(self.in_flight.len())
	}
}

/// Shared result as seen by `query`; reused as-is when the query matches
fn for_caller(result: Arc<AggregatedResult>, query: CoverageQuery) -> Arc<AggregatedResult> {
	if result.query == query {
		result
	} else {
		Arc::new(result.with_query(query))
	}
}

async fn fan_out(
	registry: &AdapterRegistry,
	providers: &ProviderService,
	query: CoverageQuery,
) -> AggregatedResult {
	let coordinates = query.coordinates();
	info!(
		"Checking coverage at {} across {} providers",
		coordinates,
		registry.len()
	);

	let tasks = registry.iter().map(|adapter| {
		let adapter: Arc<dyn CoverageAdapter> = Arc::clone(adapter);
		let providers = providers.clone();
		tokio::spawn(async move { providers.invoke(&adapter, coordinates).await })
	});
	let joined = join_all(tasks).await;

	let outcomes: Vec<ProviderOutcome> = registry
		.iter()
		.zip(joined)
		.map(|(adapter, joined)| {
			let result = joined.unwrap_or_else(|e| {
				warn!("Provider {} task did not complete: {}", adapter.name(), e);
				ProviderResult::failure(adapter.descriptor(), format!("Provider task failed: {e}"))
			});
			ProviderOutcome::new(adapter.priority(), result)
		})
		.collect();

	let result = aggregate(query, outcomes, Utc::now());
	info!(
		"Coverage check at {} completed: covered={}, best={}, technologies={}",
		coordinates,
		result.covered_any,
		result.best_provider_name().unwrap_or("none"),
		result
			.union_technologies
			.iter()
			.map(|t| t.as_str())
			.collect::<Vec<_>>()
			.join("|")
	);
	result
}
