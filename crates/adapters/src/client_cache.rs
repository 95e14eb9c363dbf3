//! HTTP client cache for upstream map services
//!
//! Provides per-provider client instances with connection pooling and
//! keep-alive, shared by every lookup against the same upstream.

use coverage_types::{AdapterError, AdapterResult};
use dashmap::DashMap;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Configuration for creating pooled HTTP clients
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientConfig {
	/// Base endpoint of the upstream
	pub base_url: String,
	/// Provider name for cache differentiation
	pub provider: String,
	/// Maximum number of idle connections per host
	pub max_idle_per_host: usize,
	/// Connection keep-alive timeout
	pub keep_alive_timeout_ms: u64,
	/// Per-request timeout enforced by the client itself
	pub request_timeout_ms: u64,
	/// Additional headers (API keys, etc.)
	pub headers: Vec<(String, String)>,
}

impl ClientConfig {
	pub fn new(provider: impl Into<String>, base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			provider: provider.into(),
			max_idle_per_host: 10,
			keep_alive_timeout_ms: 90_000,
			request_timeout_ms: 10_000,
			headers: vec![
				("User-Agent".to_string(), "Coverage-Aggregator/1.0".to_string()),
				("Accept".to_string(), "application/json".to_string()),
			],
		}
	}

	pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
		self.headers.extend(headers);
		self
	}

	pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.request_timeout_ms = timeout_ms;
		self
	}
}

/// Cached client with creation timestamp for TTL management
#[derive(Debug, Clone)]
struct CachedClient {
	client: Arc<Client>,
	created_at: Instant,
}

impl CachedClient {
	fn new(client: Client) -> Self {
		Self {
			client: Arc::new(client),
			created_at: Instant::now(),
		}
	}

	fn is_expired(&self, ttl: Duration) -> bool {
		self.created_at.elapsed() > ttl
	}
}

/// Thread-safe cache of HTTP clients keyed by client configuration, with TTL
#[derive(Clone, Debug)]
pub struct ClientCache {
	clients: Arc<DashMap<ClientConfig, CachedClient>>,
	ttl: Duration,
}

impl ClientCache {
	/// Create a new client cache with default 30-minute TTL
	pub fn new() -> Self {
		Self::with_ttl(Duration::from_secs(30 * 60))
	}

	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			clients: Arc::new(DashMap::new()),
			ttl,
		}
	}

	/// Get or create a pooled client for the given configuration
	pub fn get_client(&self, config: &ClientConfig) -> AdapterResult<Arc<Client>> {
		self.clients.remove_if(config, |_, cached_client| {
			let is_expired = cached_client.is_expired(self.ttl);
			if is_expired {
				warn!(
					"Client cache expired for {} (age: {:?}), will create new client",
					config.base_url,
					cached_client.created_at.elapsed()
				);
			}
			is_expired
		});

		if let Some(cached_client) = self.clients.get(config) {
			debug!(
				"Reusing cached client for {} (age: {:?})",
				config.base_url,
				cached_client.created_at.elapsed()
			);
			return Ok(cached_client.client.clone());
		}

		debug!("Creating new client for {} ({})", config.provider, config.base_url);
		let cached_client = CachedClient::new(Self::build_client(config)?);

		use dashmap::mapref::entry::Entry;

		match self.clients.entry(config.clone()) {
			Entry::Occupied(entry) => {
				// Lost the race; keep the client another caller inserted
				Ok(entry.get().client.clone())
			},
			Entry::Vacant(entry) => {
				let client = cached_client.client.clone();
				entry.insert(cached_client);
				Ok(client)
			},
		}
	}

	fn build_client(config: &ClientConfig) -> AdapterResult<Client> {
		let mut header_map = reqwest::header::HeaderMap::new();
		for (key, value) in &config.headers {
			if let (Ok(header_name), Ok(header_value)) = (
				reqwest::header::HeaderName::from_bytes(key.as_bytes()),
				reqwest::header::HeaderValue::from_str(value),
			) {
				header_map.insert(header_name, header_value);
			}
		}

		ClientBuilder::new()
			.pool_max_idle_per_host(config.max_idle_per_host)
			.pool_idle_timeout(Duration::from_millis(config.keep_alive_timeout_ms))
			.tcp_keepalive(Duration::from_secs(60))
			.timeout(Duration::from_millis(config.request_timeout_ms))
			.default_headers(header_map)
			.build()
			.map_err(AdapterError::HttpError)
	}

	/// Remove all expired clients, returning how many were dropped
	pub fn cleanup_expired(&self) -> usize {
		let mut removed_count = 0;

		self.clients.retain(|config, cached_client| {
			let is_expired = cached_client.is_expired(self.ttl);
			if is_expired {
				removed_count += 1;
				debug!("Removed expired client for {}", config.base_url);
			}
			!is_expired
		});

		removed_count
	}

	pub fn clear(&self) {
		let count = self.clients.len();
		self.clients.clear();
		debug!("Cleared all {} clients from cache", count);
	}

	pub fn len(&self) -> usize {
		self.clients.len()
	}

	pub fn is_empty(&self) -> bool {
		self.clients.is_empty()
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}
}

impl Default for ClientCache {
	fn default() -> Self {
		Self::new()
	}
}
