//! Threshold alerting on adapter invocations
//!
//! Each recorded invocation is checked against three thresholds: slow
//! response, failure streak, and the success/error rate over the most
//! recent invocations. Breaches are logged at `error` level and kept per
//! provider. Once a provider has alerted it stays quiet for the cooldown,
//! though its outcomes keep being counted.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use coverage_config::AlertSettings;
use coverage_types::ProviderAlert;
use dashmap::DashMap;
use std::collections::VecDeque;
use tracing::error;

#[derive(Debug, Default)]
struct AlertState {
	/// Outcomes of the most recent invocations, oldest first
	recent: VecDeque<bool>,
	consecutive_failures: u32,
	last_alert_at: Option<DateTime<Utc>>,
	raised: VecDeque<ProviderAlert>,
}

impl AlertState {
	fn push(&mut self, success: bool, keep: usize) {
		if self.recent.len() >= keep {
			self.recent.pop_front();
		}
		self.recent.push_back(success);
		if success {
			self.consecutive_failures = 0;
		} else {
			self.consecutive_failures += 1;
		}
	}

	fn success_rate(&self, min_requests: usize) -> Option<f64> {
		if self.recent.is_empty() || self.recent.len() < min_requests {
			return None;
		}
		let successes = self.recent.iter().filter(|ok| **ok).count();
		Some(successes as f64 / self.recent.len() as f64)
	}
}

#[derive(Debug)]
pub struct AlertMonitor {
	settings: AlertSettings,
	cooldown: ChronoDuration,
	providers: DashMap<String, AlertState>,
}

impl AlertMonitor {
	pub fn new(settings: AlertSettings) -> Self {
		let cooldown = i64::try_from(settings.cooldown_secs)
			.ok()
			.and_then(ChronoDuration::try_seconds)
			.unwrap_or(ChronoDuration::MAX);
		Self {
			settings,
			cooldown,
			providers: DashMap::new(),
		}
	}

	pub fn record(&self, provider: &str, success: bool, latency_ms: u64) -> Option<ProviderAlert> {
		self.record_at(provider, success, latency_ms, Utc::now())
	}

	/// Count one invocation and return the alert it raised, if any
	pub fn record_at(
		&self,
		provider: &str,
		success: bool,
		latency_ms: u64,
		at: DateTime<Utc>,
	) -> Option<ProviderAlert> {
		if !self.settings.enabled {
			return None;
		}
		let settings = &self.settings;
		let mut state = self.providers.entry(provider.to_string()).or_default();
		state.push(success, settings.recent_requests.max(1));

		if let Some(last) = state.last_alert_at {
			if at.signed_duration_since(last) < self.cooldown {
				return None;
			}
		}

		let mut messages = Vec::new();
		if latency_ms > settings.max_response_time_ms {
			messages.push(format!(
				"High response time: {}ms > {}ms",
				latency_ms, settings.max_response_time_ms
			));
		}
		if settings.consecutive_failures > 0
			&& state.consecutive_failures >= settings.consecutive_failures
		{
			messages.push(format!(
				"{} consecutive failures detected",
				state.consecutive_failures
			));
		}
		let recent_success_rate = state.success_rate(settings.min_requests);
		if let Some(rate) = recent_success_rate {
			if rate < settings.min_success_rate {
				messages.push(format!(
					"Low success rate: {:.1}% < {}%",
					rate * 100.0,
					percent(settings.min_success_rate)
				));
			}
			let error_rate = 1.0 - rate;
			if error_rate > settings.max_error_rate {
				messages.push(format!(
					"High error rate: {:.1}% > {}%",
					error_rate * 100.0,
					percent(settings.max_error_rate)
				));
			}
		}

		if messages.is_empty() {
			return None;
		}

		let alert = ProviderAlert {
			provider: provider.to_string(),
			raised_at: at,
			messages,
			latency_ms,
			consecutive_failures: state.consecutive_failures,
			recent_success_rate,
		};
		error!(
			"Coverage alert for provider {}: {}",
			provider,
			alert.messages.join("; ")
		);

		state.last_alert_at = Some(at);
		if state.raised.len() >= settings.history.max(1) {
			state.raised.pop_front();
		}
		state.raised.push_back(alert.clone());
		Some(alert)
	}

	/// Kept alerts across every provider, oldest first
	pub fn recent(&self) -> Vec<ProviderAlert> {
		let mut alerts: Vec<ProviderAlert> = self
			.providers
			.iter()
			.flat_map(|state| state.raised.iter().cloned().collect::<Vec<_>>())
			.collect();
		alerts.sort_by(|a, b| {
			a.raised_at
				.cmp(&b.raised_at)
				.then_with(|| a.provider.cmp(&b.provider))
		});
		alerts
	}

	pub fn for_provider(&self, provider: &str) -> Vec<ProviderAlert> {
		self.providers
			.get(provider)
			.map(|state| state.raised.iter().cloned().collect())
			.unwrap_or_default()
	}

	/// Forget all counters, cooldowns and kept alerts
	pub fn reset(&self) {
		self.providers.clear();
	}
}

/// Rate as a percentage without a trailing `.0`, e.g. `85` or `85.5`
fn percent(rate: f64) -> String {
	let rounded = (rate * 1000.0).round() / 10.0;
	format!("{}", rounded)
}
