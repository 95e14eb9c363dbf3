//! Configuration settings structures

use coverage_types::constants::*;
use coverage_types::models::MAX_COORDINATE_PRECISION;
use coverage_types::{GeoBounds, ProviderConfig, ProviderConfigError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	pub engine: EngineSettings,
	pub cache: CacheSettings,
	pub health: HealthSettings,
	pub metrics: MetricsSettings,
	pub alerts: AlertSettings,
	pub logging: LoggingSettings,
	/// Providers in registration order
	pub providers: Vec<ProviderConfig>,
}

/// Dispatch behaviour
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
	/// Bound on one provider invocation, rate-limit wait included
	pub provider_timeout_ms: u64,
	/// Minimum interval between requests to the same provider
	pub rate_limit_interval_ms: u64,
	/// Decimal places kept when keying caches on coordinates
	pub coordinate_precision: u32,
	/// Service area; queries outside it are rejected
	pub bounds: GeoBounds,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
			rate_limit_interval_ms: DEFAULT_RATE_LIMIT_INTERVAL_MS,
			coordinate_precision: DEFAULT_COORDINATE_PRECISION,
			bounds: GeoBounds::south_africa(),
		}
	}
}

impl EngineSettings {
	pub fn provider_timeout(&self) -> Duration {
		Duration::from_millis(self.provider_timeout_ms)
	}

	pub fn rate_limit_interval(&self) -> Duration {
		Duration::from_millis(self.rate_limit_interval_ms)
	}
}

/// Cache tier TTLs
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
	pub provider_ttl_secs: u64,
	pub aggregate_ttl_secs: u64,
	/// Period of the background expiry sweep
	pub cleanup_interval_secs: u64,
}

impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			provider_ttl_secs: DEFAULT_PROVIDER_CACHE_TTL_SECS,
			aggregate_ttl_secs: DEFAULT_AGGREGATE_CACHE_TTL_SECS,
			cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
		}
	}
}

impl CacheSettings {
	pub fn provider_ttl(&self) -> Duration {
		Duration::from_secs(self.provider_ttl_secs)
	}

	pub fn aggregate_ttl(&self) -> Duration {
		Duration::from_secs(self.aggregate_ttl_secs)
	}

	pub fn cleanup_interval(&self) -> Duration {
		Duration::from_secs(self.cleanup_interval_secs)
	}
}

/// Health classification thresholds
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HealthSettings {
	/// Rolling window length
	pub window_secs: u64,
	/// Success rate below which a provider is degraded
	pub degraded_success_rate: f64,
	/// Success rate below which a provider is unhealthy
	pub unhealthy_success_rate: f64,
	/// Consecutive failures above which a provider is degraded
	pub degraded_consecutive_failures: u32,
	/// Consecutive failures above which a provider is unhealthy
	pub unhealthy_consecutive_failures: u32,
	/// Samples needed in the window before rate thresholds apply
	pub min_requests_for_rate_check: u64,
}

impl Default for HealthSettings {
	fn default() -> Self {
		Self {
			window_secs: DEFAULT_HEALTH_WINDOW_SECS,
			degraded_success_rate: DEFAULT_DEGRADED_SUCCESS_RATE,
			unhealthy_success_rate: DEFAULT_UNHEALTHY_SUCCESS_RATE,
			degraded_consecutive_failures: DEFAULT_DEGRADED_CONSECUTIVE_FAILURES,
			unhealthy_consecutive_failures: DEFAULT_UNHEALTHY_CONSECUTIVE_FAILURES,
			min_requests_for_rate_check: DEFAULT_MIN_REQUESTS_FOR_RATE_CHECK,
		}
	}
}

impl HealthSettings {
	pub fn window(&self) -> Duration {
		Duration::from_secs(self.window_secs)
	}
}

/// Metrics history bounds
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsSettings {
	/// Samples kept per history before the oldest are dropped
	pub max_history: usize,
	/// Samples older than this are rolled off by maintenance
	pub retention_secs: u64,
}

impl Default for MetricsSettings {
	fn default() -> Self {
		Self {
			max_history: DEFAULT_METRICS_MAX_HISTORY,
			retention_secs: DEFAULT_METRICS_RETENTION_SECS,
		}
	}
}

impl MetricsSettings {
	pub fn retention(&self) -> Duration {
		Duration::from_secs(self.retention_secs)
	}
}

/// Alert thresholds evaluated after every adapter invocation
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AlertSettings {
	pub enabled: bool,
	/// Latency above which a single invocation raises an alert
	pub max_response_time_ms: u64,
	/// Recent success rate below which an alert is raised (0.0 to 1.0)
	pub min_success_rate: f64,
	/// Recent error rate above which an alert is raised (0.0 to 1.0)
	pub max_error_rate: f64,
	/// Failure streak at which an alert is raised
	pub consecutive_failures: u32,
	/// Most recent invocations the rates are computed over
	pub recent_requests: usize,
	/// Invocations needed before the rate checks apply
	pub min_requests: usize,
	/// Quiet period per provider after an alert
	pub cooldown_secs: u64,
	/// Alerts kept per provider
	pub history: usize,
}

impl Default for AlertSettings {
	fn default() -> Self {
		Self {
			enabled: true,
			max_response_time_ms: DEFAULT_ALERT_MAX_RESPONSE_TIME_MS,
			min_success_rate: DEFAULT_ALERT_MIN_SUCCESS_RATE,
			max_error_rate: DEFAULT_ALERT_MAX_ERROR_RATE,
			consecutive_failures: DEFAULT_ALERT_CONSECUTIVE_FAILURES,
			recent_requests: DEFAULT_ALERT_RECENT_REQUESTS,
			min_requests: DEFAULT_ALERT_MIN_REQUESTS,
			cooldown_secs: DEFAULT_ALERT_COOLDOWN_SECS,
			history: DEFAULT_ALERT_HISTORY,
		}
	}
}

impl AlertSettings {
	pub fn cooldown(&self) -> Duration {
		Duration::from_secs(self.cooldown_secs)
	}
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
			structured: false,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
	#[error("Provider '{name}' is defined more than once")]
	DuplicateProvider { name: String },

	#[error(transparent)]
	Provider(#[from] ProviderConfigError),

	#[error("Invalid {field}: {value}ms (must be 100-60000ms)")]
	InvalidTimeout { field: &'static str, value: u64 },

	#[error("{field} is {value}, above the maximum of {max}")]
	TooLarge {
		field: &'static str,
		value: u64,
		max: u64,
	},

	#[error("{field} must be greater than zero")]
	ZeroValue { field: &'static str },

	#[error("Invalid {field}: {value} (must be between 0.0 and 1.0)")]
	InvalidRate { field: &'static str, value: f64 },

	#[error("Unhealthy threshold ({unhealthy}) must not be stricter than degraded threshold ({degraded}) for {field}")]
	ThresholdOrder {
		field: &'static str,
		degraded: f64,
		unhealthy: f64,
	},

	#[error("Service area '{name}' has inverted or non-finite bounds")]
	InvalidBounds { name: String },

	#[error("Coordinate precision {precision} exceeds the maximum of 6")]
	InvalidPrecision { precision: u32 },
}

impl Settings {
	/// Enabled providers in registration order
	pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
		self.providers.iter().filter(|provider| provider.enabled)
	}

	/// Check every section, returning the first problem found
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		let engine = &self.engine;
		if !(MIN_PROVIDER_TIMEOUT_MS..=MAX_PROVIDER_TIMEOUT_MS).contains(&engine.provider_timeout_ms)
		{
			return Err(ConfigValidationError::InvalidTimeout {
				field: "engine.provider_timeout_ms",
				value: engine.provider_timeout_ms,
			});
		}
		if engine.coordinate_precision > MAX_COORDINATE_PRECISION {
			return Err(ConfigValidationError::InvalidPrecision {
				precision: engine.coordinate_precision,
			});
		}
		if engine.rate_limit_interval_ms > MAX_RATE_LIMIT_INTERVAL_MS {
			return Err(ConfigValidationError::TooLarge {
				field: "engine.rate_limit_interval_ms",
				value: engine.rate_limit_interval_ms,
				max: MAX_RATE_LIMIT_INTERVAL_MS,
			});
		}
		if !engine.bounds.is_well_formed() {
			return Err(ConfigValidationError::InvalidBounds {
				name: engine.bounds.name.clone(),
			});
		}

		for (field, value) in [
			("cache.provider_ttl_secs", self.cache.provider_ttl_secs),
			("cache.aggregate_ttl_secs", self.cache.aggregate_ttl_secs),
			("cache.cleanup_interval_secs", self.cache.cleanup_interval_secs),
			("health.window_secs", self.health.window_secs),
			("metrics.retention_secs", self.metrics.retention_secs),
		] {
			if value == 0 {
				return Err(ConfigValidationError::ZeroValue { field });
			}
			if value > MAX_PERIOD_SECS {
				return Err(ConfigValidationError::TooLarge {
					field,
					value,
					max: MAX_PERIOD_SECS,
				});
			}
		}
		if self.metrics.max_history == 0 {
			return Err(ConfigValidationError::ZeroValue {
				field: "metrics.max_history",
			});
		}

		self.validate_health()?;
		self.validate_alerts()?;

		let mut seen = HashSet::new();
		for provider in &self.providers {
			provider.validate()?;
			if !seen.insert(provider.name.as_str()) {
				return Err(ConfigValidationError::DuplicateProvider {
					name: provider.name.clone(),
				});
			}
		}

		Ok(())
	}

	fn validate_alerts(&self) -> Result<(), ConfigValidationError> {
		let alerts = &self.alerts;
		for (field, value) in [
			("alerts.min_success_rate", alerts.min_success_rate),
			("alerts.max_error_rate", alerts.max_error_rate),
		] {
			if !(0.0..=1.0).contains(&value) {
				return Err(ConfigValidationError::InvalidRate { field, value });
			}
		}
		for (field, value) in [
			("alerts.recent_requests", alerts.recent_requests),
			("alerts.history", alerts.history),
		] {
			if value == 0 {
				return Err(ConfigValidationError::ZeroValue { field });
			}
		}
		if alerts.cooldown_secs > MAX_PERIOD_SECS {
			return Err(ConfigValidationError::TooLarge {
				field: "alerts.cooldown_secs",
				value: alerts.cooldown_secs,
				max: MAX_PERIOD_SECS,
			});
		}
		Ok(())
	}

	fn validate_health(&self) -> Result<(), ConfigValidationError> {
		let health = &self.health;
		for (field, value) in [
			("health.degraded_success_rate", health.degraded_success_rate),
			("health.unhealthy_success_rate", health.unhealthy_success_rate),
		] {
			if !(0.0..=1.0).contains(&value) {
				return Err(ConfigValidationError::InvalidRate { field, value });
			}
		}

		if health.unhealthy_success_rate > health.degraded_success_rate {
			return Err(ConfigValidationError::ThresholdOrder {
				field: "success rate",
				degraded: health.degraded_success_rate,
				unhealthy: health.unhealthy_success_rate,
			});
		}
		if health.unhealthy_consecutive_failures < health.degraded_consecutive_failures {
			return Err(ConfigValidationError::ThresholdOrder {
				field: "consecutive failures",
				degraded: health.degraded_consecutive_failures as f64,
				unhealthy: health.unhealthy_consecutive_failures as f64,
			});
		}

		Ok(())
	}
}
