//! Coverage Aggregator Library
//!
//! Multi-provider connectivity coverage aggregation: a single location query
//! is fanned out to every registered provider adapter and the answers are
//! combined into one ranked result, with caching, per-provider rate
//! limiting, health tracking and metrics around every call.

use coverage_adapters::AdapterFactory;
use coverage_config::LogFormat;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

// Core domain types
pub use coverage_types::{
	chrono, serde_json, AdapterError, AdapterResult, AggregatedResult, Coordinates,
	CoverageAdapter, CoverageQuery, ErrorKind, GeoBounds, GeoError, HealthRecord, HealthStatus,
	MetricsWindow, ProviderAlert, ProviderComparison, ProviderConfig, ProviderDescriptor,
	ProviderKind, ProviderResult, Technology, TechnologyComparison, TechnologyRecommendation,
	TechnologySet,
};

// Service layer
pub use coverage_service::{
	compare_technology, AlertMonitor, Dispatcher, HealthMonitor, MetricsCollector, MetricsExportError, ProviderService,
	RateLimiter, RateLimiterStats, CSV_HEADER,
};

// Storage layer
pub use coverage_storage::{CacheStats, ResultCache, TierStats};

// Adapters
pub use coverage_adapters::AdapterRegistry;

// Config
pub use coverage_config::{
	load_config, load_config_from, log_engine_ready, log_service_info, log_service_shutdown,
	AlertSettings, ConfigLoadError, ConfigValidationError, LoggingSettings, Settings,
};

pub mod models {
	pub use coverage_types::*;
}

pub mod storage {
	pub use coverage_storage::*;
}

pub mod config {
	pub use coverage_config::*;
}

pub mod adapters {
	pub use coverage_adapters::*;
}

pub mod service {
	pub use coverage_service::*;
}

pub mod mocks;

// Re-export for custom adapter implementations
pub use async_trait;

/// Errors surfaced to engine callers
///
/// Provider failures never appear here; they come back inside the
/// aggregated result as non-covered entries.
#[derive(Error, Debug)]
pub enum EngineError {
	#[error("Unknown provider: {name}")]
	UnknownProvider { name: String },

	#[error("Invalid coordinates: {0}")]
	InvalidCoordinates(#[from] GeoError),

	#[error("Invalid configuration: {0}")]
	Configuration(#[from] ConfigValidationError),

	#[error("Failed to register provider: {0}")]
	Registration(#[from] AdapterError),

	#[error(transparent)]
	MetricsExport(#[from] MetricsExportError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Health of one provider, or of all of them keyed by name
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum HealthReport {
	Provider(HealthRecord),
	All(BTreeMap<String, HealthRecord>),
}

/// Builder for [`CoverageEngine`]
///
/// Providers from settings are registered first, in configuration order,
/// followed by adapters added with [`EngineBuilder::with_adapter`].
#[derive(Debug, Default)]
pub struct EngineBuilder {
	settings: Settings,
	factory: AdapterFactory,
	adapters: Vec<Arc<dyn CoverageAdapter>>,
}

impl EngineBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_settings(settings: Settings) -> Self {
		Self {
			settings,
			..Self::default()
		}
	}

	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = settings;
		self
	}

	/// Register a custom adapter after the configured ones
	pub fn with_adapter(mut self, adapter: Arc<dyn CoverageAdapter>) -> Self {
		self.adapters.push(adapter);
		self
	}

	/// Use a specific factory, e.g. one sharing a client cache
	pub fn with_factory(mut self, factory: AdapterFactory) -> Self {
		self.factory = factory;
		self
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn build(self) -> EngineResult<CoverageEngine> {
		let settings = self.settings;
		settings.validate()?;

		let mut registry = self.factory.create_registry(&settings.providers)?;
		for adapter in self.adapters {
			registry.register(adapter)?;
		}

		let mut rate_limiter = RateLimiter::new(settings.engine.rate_limit_interval());
		for provider in settings.enabled_providers() {
			if let Some(interval_ms) = provider.rate_limit_interval_ms {
				rate_limiter =
					rate_limiter.with_override(provider.name.clone(), Duration::from_millis(interval_ms));
			}
		}
		let rate_limiter = Arc::new(rate_limiter);

		let health = Arc::new(HealthMonitor::new(settings.health.clone()));
		for adapter in registry.iter() {
			health.register(adapter.name());
		}

		let metrics = Arc::new(MetricsCollector::new(&settings.metrics));
		let alerts = Arc::new(AlertMonitor::new(settings.alerts.clone()));
		let cache = ResultCache::new(settings.cache.provider_ttl(), settings.cache.aggregate_ttl());
		let providers = ProviderService::new(
			cache.clone(),
			Arc::clone(&rate_limiter),
			Arc::clone(&health),
			Arc::clone(&metrics),
			Arc::clone(&alerts),
			settings.engine.provider_timeout(),
			settings.engine.coordinate_precision,
		);
		let dispatcher = Dispatcher::new(
			Arc::new(registry),
			providers,
			cache.clone(),
			Arc::clone(&metrics),
			settings.engine.bounds.clone(),
			settings.engine.coordinate_precision,
		);

		info!(
			"Coverage engine built with {} provider(s)",
			dispatcher.registry().len()
		);

		Ok(CoverageEngine {
			settings: Arc::new(settings),
			dispatcher,
			cache,
			rate_limiter,
			health,
			metrics,
			alerts,
		})
	}
}

/// Entry point for coverage queries and operational reads
///
/// Cheap to clone; clones share caches, limiter state, health and metrics.
#[derive(Debug, Clone)]
pub struct CoverageEngine {
	settings: Arc<Settings>,
	dispatcher: Dispatcher,
	cache: ResultCache,
	rate_limiter: Arc<RateLimiter>,
	health: Arc<HealthMonitor>,
	metrics: Arc<MetricsCollector>,
	alerts: Arc<AlertMonitor>,
}

impl CoverageEngine {
	pub fn builder() -> EngineBuilder {
		EngineBuilder::new()
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Aggregate coverage across every provider
	///
	/// Only invalid coordinates fail; provider failures and timeouts are
	/// reported inside the result.
	pub async fn check_coverage(&self, query: CoverageQuery) -> EngineResult<Arc<AggregatedResult>> {
		Ok(self.dispatcher.check_coverage(query).await?)
	}

	/// Compare the providers able to deliver `technology` at one location
	///
	/// Served from the same aggregated answer as [`Self::check_coverage`].
	pub async fn compare_technology(
		&self,
		query: CoverageQuery,
		technology: Technology,
	) -> EngineResult<TechnologyComparison> {
		let result = self.dispatcher.check_coverage(query).await?;
		Ok(compare_technology(
			&result,
			technology,
			&self.dispatcher.registry().descriptors(),
		))
	}

	/// Ask one provider directly, bypassing aggregation and the aggregate cache
	pub async fn check_provider(&self, name: &str, lat: f64, lng: f64) -> EngineResult<ProviderResult> {
		self.dispatcher
			.check_provider(name, Coordinates::new(lat, lng))
			.await?
			.ok_or_else(|| EngineError::UnknownProvider {
				name: name.to_string(),
			})
	}

	pub fn get_health(&self, provider: Option<&str>) -> EngineResult<HealthReport> {
		match provider {
			Some(name) => self
				.health
				.get(name)
				.map(HealthReport::Provider)
				.ok_or_else(|| EngineError::UnknownProvider {
					name: name.to_string(),
				}),
			None => Ok(HealthReport::All(self.health.all())),
		}
	}

	pub fn get_metrics(&self, window_ms: u64) -> MetricsWindow {
		self.metrics.window(window_ms)
	}

	pub fn provider_metrics(&self, provider: &str, window_ms: u64) -> MetricsWindow {
		self.metrics.provider_window(provider, window_ms)
	}

	pub fn reset_metrics(&self) {
		self.metrics.reset();
		info!("Metrics reset");
	}

	/// Alerts raised so far, oldest first
	pub fn recent_alerts(&self) -> Vec<ProviderAlert> {
		self.alerts.recent()
	}

	pub fn reset_alerts(&self) {
		self.alerts.reset();
		info!("Alerts reset");
	}

	pub fn clear_cache(&self) {
		self.cache.clear();
		info!("Coverage caches cleared");
	}

	pub fn export_metrics_json(&self, window_ms: u64) -> EngineResult<String> {
		Ok(self.metrics.export_json(window_ms)?)
	}

	pub fn export_metrics_csv(&self, window_ms: u64) -> String {
		self.metrics.export_csv(window_ms)
	}

	/// Registered providers in registration order
	pub fn providers(&self) -> Vec<ProviderDescriptor> {
		self.dispatcher.registry().descriptors()
	}

	pub fn providers_for(&self, technology: Technology) -> Vec<ProviderDescriptor> {
		self.dispatcher.registry().supporting(technology)
	}

	pub fn cache_stats(&self) -> CacheStats {
		self.dispatcher.cache_stats()
	}

	pub fn rate_limit_stats(&self) -> Vec<RateLimiterStats> {
		self.rate_limiter.all_stats()
	}

	/// Spawn the periodic sweep of expired cache entries, stale metrics
	/// and health outcomes that have left their window
	pub fn start_maintenance(&self) -> JoinHandle<()> {
		let every = self.settings.cache.cleanup_interval();
		let cache = self.cache.clone();
		let metrics = Arc::clone(&self.metrics);
		let health = Arc::clone(&self.health);

		tokio::spawn(async move {
			let mut maintenance_interval = interval(every);
			maintenance_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				maintenance_interval.tick().await;
				let evicted = cache.purge_expired();
				let pruned = metrics.prune();
				health.prune();
				debug!(
					"Maintenance evicted {} cache entries and pruned {} metrics points",
					evicted, pruned
				);
			}
		})
	}
}

/// Install the global tracing subscriber described by `logging`
///
/// `RUST_LOG` takes precedence over the configured level. Returns `false`
/// when a subscriber was already installed.
pub fn init_tracing(logging: &LoggingSettings) -> bool {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

	let installed = match logging.format {
		LogFormat::Json => {
			let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);
			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Pretty => {
			let subscriber = tracing_subscriber::fmt()
				.pretty()
				.with_env_filter(env_filter);
			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Compact => {
			let subscriber = tracing_subscriber::fmt()
				.compact()
				.with_env_filter(env_filter);
			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
	}
	.is_ok();

	if installed {
		info!(
			"Logging configuration applied: level={}, format={:?}, structured={}",
			logging.level, logging.format, logging.structured
		);
	}
	installed
}
