//! Rolling-window provider health tracking
//!
//! Every adapter invocation feeds one outcome in. Status is re-evaluated
//! after each outcome:
//!
//! - consecutive failures above the configured counts always apply;
//! - success-rate thresholds apply once the window holds enough samples;
//! - a failure can only keep or worsen the status, a success can only keep
//!   or improve it, and improvement is capped by the windowed success rate.
//!
//! Health is reported, never enforced: dispatch ignores it.

use chrono::{DateTime, Utc};
use coverage_config::HealthSettings;
use coverage_types::{window_start, HealthRecord, HealthStatus};
use dashmap::DashMap;
use std::collections::{BTreeMap, VecDeque};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy)]
struct Outcome {
	at: DateTime<Utc>,
	success: bool,
	latency_ms: u64,
}

#[derive(Debug)]
struct ProviderHealth {
	outcomes: VecDeque<Outcome>,
	consecutive_failures: u32,
	status: HealthStatus,
	last_request_at: Option<DateTime<Utc>>,
	last_status_change: Option<DateTime<Utc>>,
}

impl ProviderHealth {
	fn new() -> Self {
		Self {
			outcomes: VecDeque::new(),
			consecutive_failures: 0,
			status: HealthStatus::Healthy,
			last_request_at: None,
			last_status_change: None,
		}
	}

	fn prune(&mut self, cutoff: DateTime<Utc>) {
		while matches!(self.outcomes.front(), Some(outcome) if outcome.at < cutoff) {
			self.outcomes.pop_front();
		}
	}

	/// (samples, success rate, average latency) over outcomes at or after `cutoff`
	fn window_stats(&self, cutoff: DateTime<Utc>) -> (u64, f64, f64) {
		let mut samples = 0u64;
		let mut successes = 0u64;
		let mut latency_total = 0u128;
		for outcome in self.outcomes.iter().filter(|o| o.at >= cutoff) {
			samples += 1;
			if outcome.success {
				successes += 1;
			}
			latency_total += outcome.latency_ms as u128;
		}

		if samples == 0 {
			return (0, 1.0, 0.0);
		}
		(
			samples,
			successes as f64 / samples as f64,
			latency_total as f64 / samples as f64,
		)
	}
}

#[derive(Debug)]
pub struct HealthMonitor {
	settings: HealthSettings,
	providers: DashMap<String, ProviderHealth>,
}

impl HealthMonitor {
	pub fn new(settings: HealthSettings) -> Self {
		Self {
			settings,
			providers: DashMap::new(),
		}
	}

	pub fn settings(&self) -> &HealthSettings {
		&self.settings
	}

	/// Start tracking a provider so it is reported before its first call
	pub fn register(&self, provider: &str) {
		self.providers
			.entry(provider.to_string())
			.or_insert_with(ProviderHealth::new);
	}

	/// Oldest outcome time still inside the window ending at `at`
	fn cutoff(&self, at: DateTime<Utc>) -> DateTime<Utc> {
		window_start(at, self.settings.window_secs.saturating_mul(1000))
	}

	/// Status implied by the success rate alone
	fn rate_status(&self, rate: f64) -> HealthStatus {
		if rate < self.settings.unhealthy_success_rate {
			HealthStatus::Unhealthy
		} else if rate < self.settings.degraded_success_rate {
			HealthStatus::Degraded
		} else {
			HealthStatus::Healthy
		}
	}

	/// Status implied by the failure streak alone
	fn streak_status(&self, consecutive_failures: u32) -> HealthStatus {
		if consecutive_failures > self.settings.unhealthy_consecutive_failures {
			HealthStatus::Unhealthy
		} else if consecutive_failures > self.settings.degraded_consecutive_failures {
			HealthStatus::Degraded
		} else {
			HealthStatus::Healthy
		}
	}

	pub fn record(&self, provider: &str, success: bool, latency_ms: u64) -> HealthStatus {
		self.record_at(provider, success, latency_ms, Utc::now())
	}

	/// Record one outcome observed at `at` and return the resulting status
	pub fn record_at(
		&self,
		provider: &str,
		success: bool,
		latency_ms: u64,
		at: DateTime<Utc>,
	) -> HealthStatus {
		let cutoff = self.cutoff(at);
		let mut health = self
			.providers
			.entry(provider.to_string())
			.or_insert_with(ProviderHealth::new);

		health.outcomes.push_back(Outcome {
			at,
			success,
			latency_ms,
		});
		health.prune(cutoff);
		health.last_request_at = Some(at);

		if success {
			health.consecutive_failures = 0;
		} else {
			health.consecutive_failures = health.consecutive_failures.saturating_add(1);
		}

		let (samples, rate, _) = health.window_stats(cutoff);
		let previous = health.status;
		let next = if success {
			// Recovery is bounded by the observed rate, however few samples
			previous.better_of(
				self.rate_status(rate)
					.worse_of(self.streak_status(health.consecutive_failures)),
			)
		} else {
			let gated_rate = if samples >= self.settings.min_requests_for_rate_check {
				self.rate_status(rate)
			} else {
				HealthStatus::Healthy
			};
			previous.worse_of(gated_rate.worse_of(self.streak_status(health.consecutive_failures)))
		};

		if next != previous {
			health.status = next;
			health.last_status_change = Some(at);
			let consecutive_failures = health.consecutive_failures;
			drop(health);
			Self::log_transition(provider, previous, next, rate, samples, consecutive_failures);
		}

		next
	}

	fn log_transition(
		provider: &str,
		from: HealthStatus,
		to: HealthStatus,
		rate: f64,
		samples: u64,
		consecutive_failures: u32,
	) {
		match to {
			HealthStatus::Unhealthy => error!(
				"Provider '{}' is unhealthy (was {}): success rate {:.1}% over {} requests, {} consecutive failures",
				provider,
				from,
				rate * 100.0,
				samples,
				consecutive_failures
			),
			HealthStatus::Degraded => warn!(
				"Provider '{}' is degraded (was {}): success rate {:.1}% over {} requests, {} consecutive failures",
				provider,
				from,
				rate * 100.0,
				samples,
				consecutive_failures
			),
			HealthStatus::Healthy => info!(
				"Provider '{}' recovered (was {}): success rate {:.1}% over {} requests",
				provider,
				from,
				rate * 100.0,
				samples
			),
		}
	}

	pub fn get(&self, provider: &str) -> Option<HealthRecord> {
		let cutoff = self.cutoff(Utc::now());
		self.providers
			.get(provider)
			.map(|health| self.snapshot(provider, &health, cutoff))
	}

	pub fn all(&self) -> BTreeMap<String, HealthRecord> {
		let cutoff = self.cutoff(Utc::now());
		self.providers
			.iter()
			.map(|entry| {
				(
					entry.key().clone(),
					self.snapshot(entry.key(), entry.value(), cutoff),
				)
			})
			.collect()
	}

	fn snapshot(
		&self,
		provider: &str,
		health: &ProviderHealth,
		cutoff: DateTime<Utc>,
	) -> HealthRecord {
		let (samples, success_rate, avg_latency_ms) = health.window_stats(cutoff);
		HealthRecord {
			provider: provider.to_string(),
			status: health.status,
			success_rate,
			avg_latency_ms,
			consecutive_failures: health.consecutive_failures,
			window_requests: samples,
			last_request_at: health.last_request_at,
			last_status_change: health.last_status_change,
		}
	}

	/// Drop outcomes that have left the window for every provider
	pub fn prune(&self) {
		let cutoff = self.cutoff(Utc::now());
		for mut entry in self.providers.iter_mut() {
			entry.prune(cutoff);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration as ChronoDuration;

	fn monitor() -> HealthMonitor {
		HealthMonitor::new(HealthSettings::default())
	}

	#[test]
	fn test_unknown_provider_has_no_record() {
		let monitor = monitor();
		assert!(monitor.get("DFA").is_none());
		monitor.register("DFA");
		let record = monitor.get("DFA").unwrap();
		assert_eq!(record.status, HealthStatus::Healthy);
		assert_eq!(record.window_requests, 0);
		assert_eq!(record.success_rate, 1.0);
	}

	#[test]
	fn test_three_failures_stay_healthy_fourth_degrades() {
		let monitor = monitor();
		for _ in 0..3 {
			assert_eq!(monitor.record("MTN", false, 8000), HealthStatus::Healthy);
		}
		assert_eq!(monitor.record("MTN", false, 8000), HealthStatus::Degraded);

		let record = monitor.get("MTN").unwrap();
		assert_eq!(record.consecutive_failures, 4);
		assert!(record.last_status_change.is_some());
	}

	#[test]
	fn test_success_resets_streak_but_not_status() {
		let monitor = monitor();
		for _ in 0..4 {
			monitor.record("MTN", false, 8000);
		}

		let status = monitor.record("MTN", true, 120);
		let record = monitor.get("MTN").unwrap();
		assert_eq!(record.consecutive_failures, 0);
		assert_eq!(status, HealthStatus::Degraded);
		assert_eq!(record.status, HealthStatus::Degraded);
	}

	#[test]
	fn test_recovers_once_rate_crosses_threshold() {
		let monitor = monitor();
		for _ in 0..4 {
			monitor.record("MTN", false, 8000);
		}

		// 4 failures need 76 successes to reach 95% over 80 samples
		for _ in 0..75 {
			assert_eq!(monitor.record("MTN", true, 100), HealthStatus::Degraded);
		}
		assert_eq!(monitor.record("MTN", true, 100), HealthStatus::Healthy);
	}

	#[test]
	fn test_long_streak_is_unhealthy() {
		let monitor = monitor();
		let mut status = HealthStatus::Healthy;
		for _ in 0..11 {
			status = monitor.record("Vuma", false, 50);
		}
		assert_eq!(status, HealthStatus::Unhealthy);
	}

	#[test]
	fn test_rate_threshold_needs_minimum_samples() {
		let monitor = monitor();
		// Alternate so the streak never exceeds 1
		for i in 0..9 {
			let status = monitor.record("Openserve", i % 2 == 0, 100);
			assert_eq!(status, HealthStatus::Healthy);
		}
		// 10th sample: 5 of 10 succeeded, 50% < 80%
		assert_eq!(
			monitor.record("Openserve", false, 100),
			HealthStatus::Unhealthy
		);
	}

	#[test]
	fn test_old_outcomes_leave_the_window() {
		let monitor = monitor();
		let two_hours_ago = Utc::now() - ChronoDuration::hours(2);
		for _ in 0..4 {
			monitor.record_at("DFA", false, 100, two_hours_ago);
		}
		assert_eq!(monitor.get("DFA").unwrap().status, HealthStatus::Degraded);

		// Failures are outside the window now, so one success recovers fully
		assert_eq!(monitor.record("DFA", true, 100), HealthStatus::Healthy);
		let record = monitor.get("DFA").unwrap();
		assert_eq!(record.window_requests, 1);
		assert_eq!(record.success_rate, 1.0);
	}

	#[test]
	fn test_all_lists_every_provider() {
		let monitor = monitor();
		monitor.register("CircleTel");
		monitor.record("DFA", true, 30);
		let all = monitor.all();
		assert_eq!(all.len(), 2);
		assert!(all.contains_key("CircleTel"));
		assert_eq!(all["DFA"].avg_latency_ms, 30.0);
	}

	#[test]
	fn test_unbounded_window_keeps_every_outcome() {
		let monitor = HealthMonitor::new(HealthSettings {
			window_secs: u64::MAX,
			..HealthSettings::default()
		});
		let long_ago = Utc::now() - ChronoDuration::days(3650);
		monitor.record_at("DFA", false, 100, long_ago);
		monitor.record("DFA", true, 100);

		let record = monitor.get("DFA").unwrap();
		assert_eq!(record.window_requests, 2);
		assert_eq!(record.success_rate, 0.5);
		monitor.prune();
		assert_eq!(monitor.all()["DFA"].window_requests, 2);
	}
}
