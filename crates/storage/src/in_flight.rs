//! In-flight request deduplication
//!
//! Concurrent callers asking for the same key share one underlying
//! computation instead of each starting their own.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Map of pending computations keyed by request
pub struct InFlight<K, V>
where
	K: Eq + Hash,
	V: Clone,
{
	pending: Arc<DashMap<K, Shared<BoxFuture<'static, V>>>>,
}

impl<K, V> Clone for InFlight<K, V>
where
	K: Eq + Hash,
	V: Clone,
{
	fn clone(&self) -> Self {
		Self {
			pending: Arc::clone(&self.pending),
		}
	}
}

impl<K, V> std::fmt::Debug for InFlight<K, V>
where
	K: Eq + Hash,
	V: Clone,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InFlight")
			.field("pending", &self.pending.len())
			.finish()
	}
}

impl<K, V> Default for InFlight<K, V>
where
	K: Eq + Hash,
	V: Clone,
{
	fn default() -> Self {
		Self {
			pending: Arc::new(DashMap::new()),
		}
	}
}

impl<K, V> InFlight<K, V>
where
	K: Eq + Hash + Clone + std::fmt::Debug,
	V: Clone + Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Join the pending computation for `key`, or start one with `make`
	///
	/// Returns the shared output and whether this caller started the
	/// computation. The entry is removed once the computation completes.
	pub async fn run<F, Fut>(&self, key: K, make: F) -> (V, bool)
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = V> + Send + 'static,
	{
		let (shared, started) = match self.pending.entry(key.clone()) {
			Entry::Occupied(entry) => {
				debug!("Joining in-flight request for {:?}", key);
				(entry.get().clone(), false)
			},
			Entry::Vacant(entry) => {
				let shared = make().boxed().shared();
				entry.insert(shared.clone());
				(shared, true)
			},
		};

		let value = shared.clone().await;
		self.pending
			.remove_if(&key, |_, pending| pending.ptr_eq(&shared));
		(value, started)
	}

	/// Number of computations currently pending
	pub fn len(&self) -> usize {
		self.pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	#[tokio::test]
	async fn test_concurrent_callers_share_one_computation() {
		let in_flight: InFlight<u32, u64> = InFlight::new();
		let calls = Arc::new(AtomicUsize::new(0));

		let tasks = (0..10).map(|_| {
			let in_flight = in_flight.clone();
			let calls = Arc::clone(&calls);
			async move {
				in_flight
					.run(1, move || async move {
						calls.fetch_add(1, Ordering::SeqCst);
						tokio::time::sleep(Duration::from_millis(50)).await;
						42
					})
					.await
			}
		});

		let results = futures::future::join_all(tasks).await;

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(results.iter().all(|(value, _)| *value == 42));
		assert_eq!(results.iter().filter(|(_, started)| *started).count(), 1);
		assert!(in_flight.is_empty());
	}

	#[tokio::test]
	async fn test_distinct_keys_run_independently() {
		let in_flight: InFlight<u32, u32> = InFlight::new();

		let (a, b) = tokio::join!(
			in_flight.run(1, || async { 1 }),
			in_flight.run(2, || async { 2 })
		);

		assert_eq!(a, (1, true));
		assert_eq!(b, (2, true));
	}

	#[tokio::test]
	async fn test_completed_key_starts_fresh() {
		let in_flight: InFlight<u32, u32> = InFlight::new();

		let (_, first) = in_flight.run(1, || async { 1 }).await;
		let (value, second) = in_flight.run(1, || async { 2 }).await;

		assert!(first);
		assert!(second);
		assert_eq!(value, 2);
	}
}
