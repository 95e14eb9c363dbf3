//! Generic concurrent TTL map

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// Stored value with its insertion time
///
/// Entries are immutable; refreshing a key replaces the entry with a new
/// timestamp.
#[derive(Debug)]
struct CacheEntry<V> {
	value: Arc<V>,
	inserted_at: Instant,
}

impl<V> CacheEntry<V> {
	fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
		now.saturating_duration_since(self.inserted_at) >= ttl
	}
}

/// Concurrent map whose entries expire a fixed time after insertion
///
/// Expired entries are never returned; they are dropped lazily on lookup
/// and eagerly by [`TtlCache::purge_expired`].
#[derive(Debug)]
pub struct TtlCache<K, V>
where
	K: Eq + Hash,
{
	entries: Arc<DashMap<K, CacheEntry<V>>>,
	ttl: Duration,
}

impl<K, V> Clone for TtlCache<K, V>
where
	K: Eq + Hash,
{
	fn clone(&self) -> Self {
		Self {
			entries: Arc::clone(&self.entries),
			ttl: self.ttl,
		}
	}
}

impl<K, V> TtlCache<K, V>
where
	K: Eq + Hash + Clone,
{
	pub fn new(ttl: Duration) -> Self {
		Self {
			entries: Arc::new(DashMap::new()),
			ttl,
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Live value for `key`, if any
	pub fn get(&self, key: &K) -> Option<Arc<V>> {
		let now = Instant::now();
		self.entries
			.remove_if(key, |_, entry| entry.is_expired(self.ttl, now));
		self.entries
			.get(key)
			.filter(|entry| !entry.is_expired(self.ttl, now))
			.map(|entry| Arc::clone(&entry.value))
	}

	/// Insert or replace; returns the stored handle
	pub fn insert(&self, key: K, value: V) -> Arc<V> {
		self.insert_arc(key, Arc::new(value))
	}

	pub fn insert_arc(&self, key: K, value: Arc<V>) -> Arc<V> {
		self.entries.insert(
			key,
			CacheEntry {
				value: Arc::clone(&value),
				inserted_at: Instant::now(),
			},
		);
		value
	}

	pub fn remove(&self, key: &K) -> Option<Arc<V>> {
		self.entries.remove(key).map(|(_, entry)| entry.value)
	}

	/// Drop every expired entry, returning how many were removed
	pub fn purge_expired(&self) -> usize {
		let now = Instant::now();
		let before = self.entries.len();
		self.entries
			.retain(|_, entry| !entry.is_expired(self.ttl, now));
		before.saturating_sub(self.entries.len())
	}

	pub fn clear(&self) {
		self.entries.clear();
	}

	/// Number of stored entries, including expired ones not yet purged
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
