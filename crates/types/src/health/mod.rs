//! Provider health classification
//!
//! Health is tracked per provider for operational visibility only; an
//! unhealthy provider is still queried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tri-state provider health, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	/// Normal operation
	Healthy,
	/// Elevated failures or a dip in success rate
	Degraded,
	/// Persistent failures
	Unhealthy,
}

impl HealthStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			HealthStatus::Healthy => "healthy",
			HealthStatus::Degraded => "degraded",
			HealthStatus::Unhealthy => "unhealthy",
		}
	}

	/// The better (less severe) of two states
	pub fn better_of(self, other: HealthStatus) -> HealthStatus {
		self.min(other)
	}

	/// The worse (more severe) of two states
	pub fn worse_of(self, other: HealthStatus) -> HealthStatus {
		self.max(other)
	}
}

impl Default for HealthStatus {
	fn default() -> Self {
		HealthStatus::Healthy
	}
}

impl fmt::Display for HealthStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Point-in-time health snapshot for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
	pub provider: String,
	pub status: HealthStatus,
	/// Success rate over the rolling window (0.0 to 1.0); 1.0 with no samples
	pub success_rate: f64,
	/// Average latency over the rolling window in milliseconds
	pub avg_latency_ms: f64,
	pub consecutive_failures: u32,
	/// Number of outcomes currently inside the window
	pub window_requests: u64,
	pub last_request_at: Option<DateTime<Utc>>,
	pub last_status_change: Option<DateTime<Utc>>,
}

impl HealthRecord {
	/// Record for a provider that has not been called yet
	pub fn new(provider: impl Into<String>) -> Self {
		Self {
			provider: provider.into(),
			status: HealthStatus::Healthy,
			success_rate: 1.0,
			avg_latency_ms: 0.0,
			consecutive_failures: 0,
			window_requests: 0,
			last_request_at: None,
			last_status_change: None,
		}
	}

	pub fn is_healthy(&self) -> bool {
		self.status == HealthStatus::Healthy
	}
}

/// Threshold breach raised for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAlert {
	pub provider: String,
	pub raised_at: DateTime<Utc>,
	/// One line per breached threshold
	pub messages: Vec<String>,
	/// Latency of the invocation that raised the alert
	pub latency_ms: u64,
	pub consecutive_failures: u32,
	/// Success rate over the recent invocations, when enough exist
	pub recent_success_rate: Option<f64>,
}
