//! Sliding-window metrics snapshot

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::adapters::ErrorKind;
use crate::models::Technology;

/// Format used for hourly bucket keys, e.g. `2024-03-01T14`
pub const HOURLY_BUCKET_FORMAT: &str = "%Y-%m-%dT%H";

/// One recorded adapter invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDataPoint {
	/// When the invocation finished
	pub timestamp: DateTime<Utc>,
	pub provider: String,
	/// Technology the invocation was keyed under, if any
	pub technology: Option<Technology>,
	pub latency_ms: u64,
	pub was_successful: bool,
	/// Set for failed invocations
	pub error_kind: Option<ErrorKind>,
}

impl MetricsDataPoint {
	pub fn success(
		provider: impl Into<String>,
		technology: Option<Technology>,
		latency_ms: u64,
	) -> Self {
		Self {
			timestamp: Utc::now(),
			provider: provider.into(),
			technology,
			latency_ms,
			was_successful: true,
			error_kind: None,
		}
	}

	pub fn failure(
		provider: impl Into<String>,
		technology: Option<Technology>,
		latency_ms: u64,
		error_kind: ErrorKind,
	) -> Self {
		Self {
			timestamp: Utc::now(),
			provider: provider.into(),
			technology,
			latency_ms,
			was_successful: false,
			error_kind: Some(error_kind),
		}
	}

	pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = timestamp;
		self
	}
}

/// One cache lookup; `provider` is `None` for the aggregate tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheLookupPoint {
	pub timestamp: DateTime<Utc>,
	pub provider: Option<String>,
	pub hit: bool,
}

impl CacheLookupPoint {
	pub fn new(provider: Option<String>, hit: bool) -> Self {
		Self {
			timestamp: Utc::now(),
			provider,
			hit,
		}
	}
}

/// Latency distribution over a set of samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyStats {
	pub samples: u64,
	pub avg_ms: f64,
	pub median_ms: f64,
	pub p95_ms: u64,
	pub p99_ms: u64,
	pub min_ms: u64,
	pub max_ms: u64,
}

impl LatencyStats {
	/// Compute from raw samples; an empty slice yields all zeros
	///
	/// Percentiles use the nearest-rank index `floor(n * p)` on the sorted
	/// samples, clamped to the last element.
	pub fn from_samples(samples: &[u64]) -> Self {
		if samples.is_empty() {
			return Self::default();
		}

		let mut sorted = samples.to_vec();
		sorted.sort_unstable();
		let len = sorted.len();

		let sum: u128 = sorted.iter().map(|v| *v as u128).sum();
		let median = if len % 2 == 0 {
			(sorted[len / 2 - 1] as f64 + sorted[len / 2] as f64) / 2.0
		} else {
			sorted[len / 2] as f64
		};

		Self {
			samples: len as u64,
			avg_ms: sum as f64 / len as f64,
			median_ms: median,
			p95_ms: percentile(&sorted, 0.95),
			p99_ms: percentile(&sorted, 0.99),
			min_ms: sorted[0],
			max_ms: sorted[len - 1],
		}
	}
}

fn percentile(sorted: &[u64], p: f64) -> u64 {
	let index = ((sorted.len() as f64) * p).floor() as usize;
	sorted[index.min(sorted.len() - 1)]
}

/// Request counters and latency for one slice of the window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownStats {
	pub total_requests: u64,
	pub success_count: u64,
	pub failure_count: u64,
	/// 0.0 to 1.0; 0.0 when empty
	pub success_rate: f64,
	pub avg_latency_ms: f64,
	pub error_counts: BTreeMap<ErrorKind, u64>,
}

impl BreakdownStats {
	fn add(&mut self, point: &MetricsDataPoint) {
		let old_total = self.total_requests;
		self.total_requests += 1;
		if point.was_successful {
			self.success_count += 1;
		} else {
			self.failure_count += 1;
		}
		if let Some(kind) = point.error_kind {
			*self.error_counts.entry(kind).or_insert(0) += 1;
		}

		// Welford running mean
		if old_total == 0 {
			self.avg_latency_ms = point.latency_ms as f64;
		} else {
			let delta = point.latency_ms as f64 - self.avg_latency_ms;
			self.avg_latency_ms += delta / self.total_requests as f64;
		}

		self.success_rate = self.success_count as f64 / self.total_requests as f64;
	}
}

/// Read-only view of everything recorded within a time window
///
/// Built by feeding data points and cache lookups in, then calling
/// [`MetricsWindow::finalize`] to compute the latency distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsWindow {
	pub window_duration_ms: u64,
	pub window_start: DateTime<Utc>,
	pub generated_at: DateTime<Utc>,
	pub total_requests: u64,
	pub success_count: u64,
	pub failure_count: u64,
	/// 0.0 to 1.0; 0.0 when the window is empty
	pub success_rate: f64,
	pub latency_samples: Vec<u64>,
	pub latency: LatencyStats,
	pub error_counts: BTreeMap<ErrorKind, u64>,
	pub cache_hits: u64,
	pub cache_misses: u64,
	/// Hits over lookups; 0.0 when there were no lookups
	pub cache_hit_ratio: f64,
	pub per_provider: BTreeMap<String, BreakdownStats>,
	pub per_technology: BTreeMap<Technology, BreakdownStats>,
	/// Keyed by [`HOURLY_BUCKET_FORMAT`]
	pub hourly: BTreeMap<String, BreakdownStats>,
}

impl MetricsWindow {
	/// Empty window ending at `generated_at`
	pub fn new(window_duration_ms: u64, generated_at: DateTime<Utc>) -> Self {
		let window_start = window_start(generated_at, window_duration_ms);
		Self {
			window_duration_ms,
			window_start,
			generated_at,
			total_requests: 0,
			success_count: 0,
			failure_count: 0,
			success_rate: 0.0,
			latency_samples: Vec::new(),
			latency: LatencyStats::default(),
			error_counts: BTreeMap::new(),
			cache_hits: 0,
			cache_misses: 0,
			cache_hit_ratio: 0.0,
			per_provider: BTreeMap::new(),
			per_technology: BTreeMap::new(),
			hourly: BTreeMap::new(),
		}
	}

	/// Whether `timestamp` falls inside this window
	pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
		timestamp >= self.window_start && timestamp <= self.generated_at
	}

	pub fn add_data_point(&mut self, point: &MetricsDataPoint) {
		self.total_requests += 1;
		if point.was_successful {
			self.success_count += 1;
		} else {
			self.failure_count += 1;
		}
		if let Some(kind) = point.error_kind {
			*self.error_counts.entry(kind).or_insert(0) += 1;
		}
		self.latency_samples.push(point.latency_ms);

		self.per_provider
			.entry(point.provider.clone())
			.or_default()
			.add(point);
		if let Some(technology) = point.technology {
			self.per_technology.entry(technology).or_default().add(point);
		}
		self.hourly
			.entry(hour_bucket(point.timestamp))
			.or_default()
			.add(point);
	}

	pub fn add_cache_lookup(&mut self, lookup: &CacheLookupPoint) {
		if lookup.hit {
			self.cache_hits += 1;
		} else {
			self.cache_misses += 1;
		}
	}

	/// Compute derived rates and the latency distribution
	pub fn finalize(mut self) -> Self {
		self.success_rate = if self.total_requests > 0 {
			self.success_count as f64 / self.total_requests as f64
		} else {
			0.0
		};
		let lookups = self.cache_hits + self.cache_misses;
		self.cache_hit_ratio = if lookups > 0 {
			self.cache_hits as f64 / lookups as f64
		} else {
			0.0
		};
		self.latency = LatencyStats::from_samples(&self.latency_samples);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.total_requests == 0 && self.cache_hits == 0 && self.cache_misses == 0
	}
}

/// Start of a trailing window of `window_ms` ending at `end`
///
/// Windows reaching past the representable range start at
/// [`DateTime::<Utc>::MIN_UTC`] instead of overflowing.
pub fn window_start(end: DateTime<Utc>, window_ms: u64) -> DateTime<Utc> {
	i64::try_from(window_ms)
		.ok()
		.and_then(chrono::TimeDelta::try_milliseconds)
		.and_then(|window| end.checked_sub_signed(window))
		.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Hourly bucket key for a timestamp
pub fn hour_bucket(timestamp: DateTime<Utc>) -> String {
	let truncated = timestamp
		.with_minute(0)
		.and_then(|t| t.with_second(0))
		.unwrap_or(timestamp);
	truncated.format(HOURLY_BUCKET_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn test_latency_stats_percentiles() {
		let samples: Vec<u64> = (1..=100).collect();
		let stats = LatencyStats::from_samples(&samples);
		assert_eq!(stats.samples, 100);
		assert_eq!(stats.min_ms, 1);
		assert_eq!(stats.max_ms, 100);
		assert_eq!(stats.median_ms, 50.5);
		assert_eq!(stats.p95_ms, 96);
		assert_eq!(stats.p99_ms, 100);
		assert!((stats.avg_ms - 50.5).abs() < f64::EPSILON);
	}

	#[test]
	fn test_latency_stats_empty_and_single() {
		assert_eq!(LatencyStats::from_samples(&[]), LatencyStats::default());

		let single = LatencyStats::from_samples(&[42]);
		assert_eq!(single.p95_ms, 42);
		assert_eq!(single.p99_ms, 42);
		assert_eq!(single.median_ms, 42.0);
	}

	#[test]
	fn test_window_breakdowns() {
		let now = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
		let mut window = MetricsWindow::new(3_600_000, now);

		window.add_data_point(
			&MetricsDataPoint::success("CircleTel", Some(Technology::FixedWireless), 120).at(now),
		);
		window.add_data_point(
			&MetricsDataPoint::failure(
				"MTN",
				Some(Technology::Lte),
				8000,
				ErrorKind::TransportFailure,
			)
			.at(now),
		);
		window.add_cache_lookup(&CacheLookupPoint::new(None, true));
		window.add_cache_lookup(&CacheLookupPoint::new(Some("MTN".into()), false));
		window.add_cache_lookup(&CacheLookupPoint::new(Some("MTN".into()), false));
		window.add_cache_lookup(&CacheLookupPoint::new(None, true));

		let window = window.finalize();
		assert_eq!(window.total_requests, 2);
		assert_eq!(window.success_rate, 0.5);
		assert_eq!(window.cache_hit_ratio, 0.5);
		assert_eq!(window.error_counts.get(&ErrorKind::TransportFailure), Some(&1));
		assert_eq!(window.per_provider["MTN"].failure_count, 1);
		assert_eq!(window.per_provider["CircleTel"].success_rate, 1.0);
		assert_eq!(window.per_technology[&Technology::Lte].total_requests, 1);
		assert_eq!(window.hourly["2024-03-01T14"].total_requests, 2);
		assert_eq!(window.latency.max_ms, 8000);
	}

	#[test]
	fn test_window_contains() {
		let now = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
		let window = MetricsWindow::new(60_000, now);
		assert!(window.contains(now - chrono::Duration::seconds(30)));
		assert!(!window.contains(now - chrono::Duration::seconds(90)));
	}

	#[test]
	fn test_unbounded_window_starts_at_min_time() {
		let now = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();

		let window = MetricsWindow::new(u64::MAX, now);
		assert_eq!(window.window_start, DateTime::<Utc>::MIN_UTC);
		assert!(window.contains(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()));

		// Fits in an i64 but reaches past the earliest representable instant
		let window = MetricsWindow::new(i64::MAX as u64, now);
		assert_eq!(window.window_start, DateTime::<Utc>::MIN_UTC);
	}
}
