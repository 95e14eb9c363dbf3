//! One gated, time-boxed, recorded invocation of one adapter

use coverage_types::{
	AdapterError, CacheLookupPoint, Coordinates, CoverageAdapter, MetricsDataPoint, ProviderResult,
};
use coverage_storage::{ProviderCacheKey, ResultCache};
use std::sync::Arc;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, warn};

use crate::alerts::AlertMonitor;
use crate::health::HealthMonitor;
use crate::metrics::MetricsCollector;
use crate::rate_limiter::RateLimiter;

/// Wraps adapter calls with the per-provider cache, rate limiting, a
/// timeout, and health/metrics/alert recording
///
/// `invoke` never fails: adapter errors and timeouts come back as
/// non-covered results carrying the failure in their note. The timeout and
/// the recorded latency cover the adapter call only; time spent waiting on
/// the rate limiter is local queueing and is not held against the provider.
#[derive(Debug, Clone)]
pub struct ProviderService {
	cache: ResultCache,
	rate_limiter: Arc<RateLimiter>,
	health: Arc<HealthMonitor>,
	metrics: Arc<MetricsCollector>,
	alerts: Arc<AlertMonitor>,
	provider_timeout: Duration,
	coordinate_precision: u32,
}

impl ProviderService {
	pub fn new(
		cache: ResultCache,
		rate_limiter: Arc<RateLimiter>,
		health: Arc<HealthMonitor>,
		metrics: Arc<MetricsCollector>,
		alerts: Arc<AlertMonitor>,
		provider_timeout: Duration,
		coordinate_precision: u32,
	) -> Self {
		Self {
			cache,
			rate_limiter,
			health,
			metrics,
			alerts,
			provider_timeout,
			coordinate_precision,
		}
	}

	pub fn provider_timeout(&self) -> Duration {
		self.provider_timeout
	}

	pub async fn invoke(
		&self,
		adapter: &Arc<dyn CoverageAdapter>,
		coordinates: Coordinates,
	) -> ProviderResult {
		let descriptor = adapter.descriptor();
		let technology = descriptor.primary_technology();
		let key = ProviderCacheKey::new(
			descriptor.name.clone(),
			technology,
			coordinates.round(self.coordinate_precision),
		);

		let cached = self.cache.get_provider(&key);
		self.metrics.record_cache_lookup(CacheLookupPoint::new(
			Some(descriptor.name.clone()),
			cached.is_some(),
		));
		if let Some(result) = cached {
			return (*result).clone();
		}

		let generation = self.cache.generation();
		self.rate_limiter.acquire(&descriptor.name).await;

		let started = Instant::now();
		let outcome = timeout(self.provider_timeout, adapter.check_coverage(coordinates))
			.await
			.unwrap_or_else(|_| {
				Err(AdapterError::Timeout {
					timeout_ms: self.provider_timeout.as_millis() as u64,
				})
			});
		let latency_ms = started.elapsed().as_millis() as u64;

		match outcome {
			Ok(result) => {
				debug!(
					"Provider {} answered in {}ms (covered: {})",
					descriptor.name, latency_ms, result.covered
				);
				self.health.record(&descriptor.name, true, latency_ms);
				self.alerts.record(&descriptor.name, true, latency_ms);
				self.metrics.record_call(MetricsDataPoint::success(
					descriptor.name.clone(),
					technology,
					latency_ms,
				));
				self.cache
					.put_provider_if_current(generation, key, result.clone());
				result
			},
			Err(e) => {
				let kind = e.kind();
				warn!(
					"Provider {} failed after {}ms ({}): {}",
					descriptor.name, latency_ms, kind, e
				);
				self.health.record(&descriptor.name, false, latency_ms);
				self.alerts.record(&descriptor.name, false, latency_ms);
				self.metrics.record_call(MetricsDataPoint::failure(
					descriptor.name.clone(),
					technology,
					latency_ms,
					kind,
				));
				ProviderResult::failure(descriptor, e.to_string())
			},
		}
	}
}
