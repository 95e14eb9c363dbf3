//! In-memory metrics history
//!
//! Adapter invocations and cache lookups are appended to bounded per-key
//! histories; windows are computed on demand from whatever is still held.

use chrono::{DateTime, Utc};
use coverage_config::MetricsSettings;
use coverage_types::{window_start, CacheLookupPoint, MetricsDataPoint, MetricsWindow};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::fmt::Write;
use thiserror::Error;
use tracing::debug;

/// Header row of [`MetricsCollector::export_csv`]
pub const CSV_HEADER: &str = "timestamp,provider,technology,latency_ms,success,error_kind";

#[derive(Error, Debug)]
pub enum MetricsExportError {
	#[error("Failed to serialize metrics: {0}")]
	Serialization(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct MetricsCollector {
	max_history: usize,
	retention_ms: u64,
	calls: DashMap<String, VecDeque<MetricsDataPoint>>,
	/// Keyed by provider; `None` is the aggregate tier
	lookups: DashMap<Option<String>, VecDeque<CacheLookupPoint>>,
}

impl MetricsCollector {
	pub fn new(settings: &MetricsSettings) -> Self {
		Self {
			max_history: settings.max_history.max(1),
			retention_ms: settings.retention_secs.saturating_mul(1000),
			calls: DashMap::new(),
			lookups: DashMap::new(),
		}
	}

	/// Append one invocation, evicting the oldest point for that provider
	/// once its history is full
	pub fn record_call(&self, point: MetricsDataPoint) {
		let mut history = self.calls.entry(point.provider.clone()).or_default();
		if history.len() >= self.max_history {
			history.pop_front();
		}
		history.push_back(point);
	}

	pub fn record_cache_lookup(&self, lookup: CacheLookupPoint) {
		let mut history = self.lookups.entry(lookup.provider.clone()).or_default();
		if history.len() >= self.max_history {
			history.pop_front();
		}
		history.push_back(lookup);
	}

	/// Aggregate everything recorded in the last `window_ms` milliseconds
	pub fn window(&self, window_ms: u64) -> MetricsWindow {
		self.window_at(window_ms, Utc::now())
	}

	pub fn window_at(&self, window_ms: u64, now: DateTime<Utc>) -> MetricsWindow {
		let mut window = MetricsWindow::new(window_ms, now);
		let (start, end) = (window.window_start, window.generated_at);
		let in_window = |ts: DateTime<Utc>| ts >= start && ts <= end;
		for history in self.calls.iter() {
			for point in history.iter().filter(|p| in_window(p.timestamp)) {
				window.add_data_point(point);
			}
		}
		for history in self.lookups.iter() {
			for lookup in history.iter().filter(|l| in_window(l.timestamp)) {
				window.add_cache_lookup(lookup);
			}
		}
		window.finalize()
	}

	/// Window restricted to one provider's invocations and lookups
	pub fn provider_window(&self, provider: &str, window_ms: u64) -> MetricsWindow {
		let mut window = MetricsWindow::new(window_ms, Utc::now());
		let (start, end) = (window.window_start, window.generated_at);
		let in_window = |ts: DateTime<Utc>| ts >= start && ts <= end;
		if let Some(history) = self.calls.get(provider) {
			for point in history.iter().filter(|p| in_window(p.timestamp)) {
				window.add_data_point(point);
			}
		}
		if let Some(history) = self.lookups.get(&Some(provider.to_string())) {
			for lookup in history.iter().filter(|l| in_window(l.timestamp)) {
				window.add_cache_lookup(lookup);
			}
		}
		window.finalize()
	}

	/// Points currently held across every history
	pub fn len(&self) -> usize {
		self.calls.iter().map(|h| h.len()).sum::<usize>()
			+ self.lookups.iter().map(|h| h.len()).sum::<usize>()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn reset(&self) {
		self.calls.clear();
		self.lookups.clear();
		debug!("Metrics history reset");
	}

	/// Drop points older than the retention period, returning how many were removed
	pub fn prune(&self) -> usize {
		self.prune_before(window_start(Utc::now(), self.retention_ms))
	}

	pub fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
		let mut removed = 0;
		for mut history in self.calls.iter_mut() {
			let before = history.len();
			history.retain(|p| p.timestamp >= cutoff);
			removed += before - history.len();
		}
		for mut history in self.lookups.iter_mut() {
			let before = history.len();
			history.retain(|l| l.timestamp >= cutoff);
			removed += before - history.len();
		}
		self.calls.retain(|_, history| !history.is_empty());
		self.lookups.retain(|_, history| !history.is_empty());

		if removed > 0 {
			debug!("Pruned {} metrics points older than {}", removed, cutoff);
		}
		removed
	}

	pub fn export_json(&self, window_ms: u64) -> Result<String, MetricsExportError> {
		Ok(serde_json::to_string_pretty(&self.window(window_ms))?)
	}

	/// Raw invocations inside the window, oldest first
	pub fn export_csv(&self, window_ms: u64) -> String {
		let window = MetricsWindow::new(window_ms, Utc::now());
		let mut points: Vec<MetricsDataPoint> = self
			.calls
			.iter()
			.flat_map(|history| {
				history
					.iter()
					.filter(|p| window.contains(p.timestamp))
					.cloned()
					.collect::<Vec<_>>()
			})
			.collect();
		points.sort_by(|a, b| {
			a.timestamp
				.cmp(&b.timestamp)
				.then_with(|| a.provider.cmp(&b.provider))
		});

		let mut csv = String::from(CSV_HEADER);
		csv.push('\n');
		for point in points {
			let _ = writeln!(
				csv,
				"{},{},{},{},{},{}",
				point.timestamp.to_rfc3339(),
				csv_field(&point.provider),
				point.technology.map(|t| t.as_str()).unwrap_or(""),
				point.latency_ms,
				point.was_successful,
				point.error_kind.map(|k| k.as_str()).unwrap_or(""),
			);
		}
		csv
	}
}

fn csv_field(value: &str) -> String {
	if value.contains([',', '"', '\n']) {
		format!("\"{}\"", value.replace('"', "\"\""))
	} else {
		value.to_string()
	}
}
