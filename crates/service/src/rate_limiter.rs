//! Per-provider minimum-interval rate limiter
//!
//! Each provider gets its own slot; callers for one provider queue behind a
//! fair mutex and are granted in arrival order, while callers for different
//! providers never contend.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct ProviderSlot {
	interval: Duration,
	/// Time of the last grant; the tokio mutex queues waiters FIFO
	last_grant: Mutex<Option<Instant>>,
	granted: AtomicU64,
	waited: AtomicU64,
	total_wait_us: AtomicU64,
}

impl ProviderSlot {
	fn new(interval: Duration) -> Self {
		Self {
			interval,
			last_grant: Mutex::new(None),
			granted: AtomicU64::new(0),
			waited: AtomicU64::new(0),
			total_wait_us: AtomicU64::new(0),
		}
	}
}

/// Limiter counters for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimiterStats {
	pub provider: String,
	pub interval_ms: u64,
	/// Requests granted so far
	pub granted: u64,
	/// Grants that had to wait for the interval to elapse
	pub waited: u64,
	/// Mean wait over the grants that waited
	pub avg_wait_ms: f64,
}

#[derive(Debug)]
pub struct RateLimiter {
	default_interval: Duration,
	overrides: DashMap<String, Duration>,
	slots: DashMap<String, Arc<ProviderSlot>>,
}

impl RateLimiter {
	pub fn new(default_interval: Duration) -> Self {
		Self {
			default_interval,
			overrides: DashMap::new(),
			slots: DashMap::new(),
		}
	}

	/// Use a different interval for one provider
	///
	/// Takes effect for providers that have not been acquired yet.
	pub fn with_override(self, provider: impl Into<String>, interval: Duration) -> Self {
		self.overrides.insert(provider.into(), interval);
		self
	}

	pub fn interval_for(&self, provider: &str) -> Duration {
		self.overrides
			.get(provider)
			.map(|interval| *interval)
			.unwrap_or(self.default_interval)
	}

	fn slot(&self, provider: &str) -> Arc<ProviderSlot> {
		if let Some(slot) = self.slots.get(provider) {
			return Arc::clone(slot.value());
		}
		let interval = self.interval_for(provider);
		self.slots
			.entry(provider.to_string())
			.or_insert_with(|| Arc::new(ProviderSlot::new(interval)))
			.value()
			.clone()
	}

	/// Wait until `provider` may be called again, then record the grant
	///
	/// Returns how long the caller waited.
	pub async fn acquire(&self, provider: &str) -> Duration {
		let slot = self.slot(provider);
		let started = Instant::now();
		let mut held = false;

		let mut last_grant = slot.last_grant.lock().await;
		if let Some(previous) = *last_grant {
			let ready_at = previous + slot.interval;
			if ready_at > Instant::now() {
				sleep_until(ready_at).await;
				held = true;
			}
		}
		*last_grant = Some(Instant::now());
		drop(last_grant);

		slot.granted.fetch_add(1, Ordering::Relaxed);
		if !held {
			return Duration::ZERO;
		}

		let waited = started.elapsed();
		slot.waited.fetch_add(1, Ordering::Relaxed);
		slot.total_wait_us
			.fetch_add(waited.as_micros() as u64, Ordering::Relaxed);
		debug!("Rate limiter held {} for {:?}", provider, waited);
		waited
	}

	pub fn stats(&self, provider: &str) -> Option<RateLimiterStats> {
		self.slots
			.get(provider)
			.map(|slot| Self::snapshot(provider, &slot))
	}

	/// Stats for every provider that has been acquired, sorted by name
	pub fn all_stats(&self) -> Vec<RateLimiterStats> {
		let mut stats: Vec<_> = self
			.slots
			.iter()
			.map(|entry| Self::snapshot(entry.key(), entry.value()))
			.collect();
		stats.sort_by(|a, b| a.provider.cmp(&b.provider));
		stats
	}

	fn snapshot(provider: &str, slot: &ProviderSlot) -> RateLimiterStats {
		let waited = slot.waited.load(Ordering::Relaxed);
		let total_wait_us = slot.total_wait_us.load(Ordering::Relaxed);
		RateLimiterStats {
			provider: provider.to_string(),
			interval_ms: slot.interval.as_millis() as u64,
			granted: slot.granted.load(Ordering::Relaxed),
			waited,
			avg_wait_ms: if waited > 0 {
				total_wait_us as f64 / waited as f64 / 1000.0
			} else {
				0.0
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex as StdMutex;

	#[tokio::test(start_paused = true)]
	async fn test_first_acquire_is_immediate() {
		let limiter = RateLimiter::new(Duration::from_millis(250));
		let waited = limiter.acquire("DFA").await;
		assert!(waited.is_zero());

		let stats = limiter.stats("DFA").unwrap();
		assert_eq!(stats.granted, 1);
		assert_eq!(stats.waited, 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_back_to_back_calls_are_spaced() {
		let limiter = RateLimiter::new(Duration::from_millis(250));
		let start = Instant::now();

		limiter.acquire("DFA").await;
		limiter.acquire("DFA").await;
		limiter.acquire("DFA").await;

		assert!(start.elapsed() >= Duration::from_millis(500));
		let stats = limiter.stats("DFA").unwrap();
		assert_eq!(stats.granted, 3);
		assert_eq!(stats.waited, 2);
		assert!((stats.avg_wait_ms - 250.0).abs() < 1.0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_concurrent_callers_granted_in_order() {
		let limiter = Arc::new(RateLimiter::new(Duration::from_millis(250)));
		let grants = Arc::new(StdMutex::new(Vec::new()));
		let start = Instant::now();

		let mut handles = Vec::new();
		for id in 0..4 {
			let limiter = Arc::clone(&limiter);
			let grants = Arc::clone(&grants);
			handles.push(tokio::spawn(async move {
				limiter.acquire("Openserve").await;
				grants.lock().unwrap().push((id, start.elapsed()));
			}));
			// Let each task reach the queue before spawning the next
			tokio::task::yield_now().await;
		}
		for handle in handles {
			handle.await.unwrap();
		}

		let grants = grants.lock().unwrap().clone();
		let order: Vec<_> = grants.iter().map(|(id, _)| *id).collect();
		assert_eq!(order, vec![0, 1, 2, 3]);
		for pair in grants.windows(2) {
			assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(250));
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_providers_do_not_block_each_other() {
		let limiter = RateLimiter::new(Duration::from_secs(10));
		limiter.acquire("Vuma").await;

		let start = Instant::now();
		limiter.acquire("MTN").await;
		assert!(start.elapsed() < Duration::from_millis(1));
	}

	#[tokio::test(start_paused = true)]
	async fn test_override_interval() {
		let limiter = RateLimiter::new(Duration::from_millis(250))
			.with_override("MTN", Duration::from_millis(1000));
		assert_eq!(limiter.interval_for("MTN"), Duration::from_millis(1000));
		assert_eq!(limiter.interval_for("DFA"), Duration::from_millis(250));

		let start = Instant::now();
		limiter.acquire("MTN").await;
		limiter.acquire("MTN").await;
		assert!(start.elapsed() >= Duration::from_millis(1000));
		assert_eq!(limiter.all_stats()[0].interval_ms, 1000);
	}

	#[tokio::test(start_paused = true)]
	async fn test_no_wait_after_interval_elapsed() {
		let limiter = RateLimiter::new(Duration::from_millis(250));
		limiter.acquire("DFA").await;
		tokio::time::advance(Duration::from_millis(300)).await;
		assert!(limiter.acquire("DFA").await.is_zero());
	}
}
