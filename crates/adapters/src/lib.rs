//! Coverage Adapters
//!
//! Provider adapters for the coverage aggregator, and the factory that
//! builds them from configuration.

pub mod client_cache;
pub mod fibre_polygon;
pub mod http_lookup;
pub mod mobile_map;
pub mod registry;
pub mod tower_radius;

pub use client_cache::{ClientCache, ClientConfig};
pub use coverage_types::{AdapterError, AdapterResult, CoverageAdapter};
pub use fibre_polygon::FibrePolygonAdapter;
pub use http_lookup::HttpMapLookup;
pub use mobile_map::{MapLookup, MobileMapAdapter, SignalQuality, SignalReading};
pub use registry::AdapterRegistry;
pub use tower_radius::TowerRadiusAdapter;

use coverage_types::{ProviderConfig, ProviderKind};
use std::sync::Arc;
use tracing::{debug, info};

/// Builds adapters from provider configuration
///
/// HTTP-backed adapters share the factory's client cache so that providers
/// pointing at the same upstream reuse pooled connections.
#[derive(Debug, Clone, Default)]
pub struct AdapterFactory {
	clients: ClientCache,
	request_timeout_ms: Option<u64>,
}

impl AdapterFactory {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_client_cache(clients: ClientCache) -> Self {
		Self {
			clients,
			request_timeout_ms: None,
		}
	}

	/// Bound each upstream HTTP request independently of the engine timeout
	pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.request_timeout_ms = Some(timeout_ms);
		self
	}

	pub fn client_cache(&self) -> &ClientCache {
		&self.clients
	}

	/// Create one adapter from its configuration entry
	pub fn create(&self, config: &ProviderConfig) -> AdapterResult<Arc<dyn CoverageAdapter>> {
		config.validate().map_err(|e| AdapterError::ConfigError {
			reason: e.to_string(),
		})?;

		debug!("Creating {} adapter for {}", config.kind.as_str(), config.name);

		let adapter: Arc<dyn CoverageAdapter> = match &config.kind {
			ProviderKind::TowerRadius(tower) => Arc::new(TowerRadiusAdapter::new(
				config.name.clone(),
				config.priority,
				tower.clone(),
			)),
			ProviderKind::FibrePolygon(fibre) => Arc::new(FibrePolygonAdapter::new(
				config.name.clone(),
				config.priority,
				fibre.clone(),
			)),
			ProviderKind::MobileMap(mobile) => {
				let mut client_config = ClientConfig::new(config.name.clone(), mobile.endpoint.clone())
					.with_headers(mobile.headers.iter().cloned());
				if let Some(timeout_ms) = self.request_timeout_ms {
					client_config = client_config.with_request_timeout_ms(timeout_ms);
				}
				let lookup = Arc::new(HttpMapLookup::new(client_config, self.clients.clone()));
				Arc::new(MobileMapAdapter::new(
					config.name.clone(),
					config.priority,
					mobile,
					lookup,
				))
			},
		};

		Ok(adapter)
	}

	/// Build a registry from every enabled entry, in configuration order
	pub fn create_registry(&self, configs: &[ProviderConfig]) -> AdapterResult<AdapterRegistry> {
		let mut registry = AdapterRegistry::new();

		for config in configs {
			if !config.enabled {
				info!("Skipping disabled provider {}", config.name);
				continue;
			}
			registry.register(self.create(config)?)?;
		}

		Ok(registry)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use coverage_types::{
		FibrePolygonConfig, MobileMapConfig, Technology, TowerRadiusConfig, TowerSite,
	};

	fn configs() -> Vec<ProviderConfig> {
		vec![
			ProviderConfig::new(
				"CircleTel",
				10,
				ProviderKind::TowerRadius(TowerRadiusConfig::new(vec![TowerSite::new(
					"Johannesburg",
					-26.2041,
					28.0473,
					15.0,
				)])),
			),
			ProviderConfig::new(
				"DFA",
				8,
				ProviderKind::FibrePolygon(FibrePolygonConfig { areas: vec![] }),
			),
			ProviderConfig::new(
				"MTN",
				6,
				ProviderKind::MobileMap(MobileMapConfig::new("https://coverage.example.com")),
			),
		]
	}

	#[test]
	fn test_create_registry_from_config() {
		let registry = AdapterFactory::new().create_registry(&configs()).unwrap();
		assert_eq!(registry.len(), 3);

		let mtn = registry.get("MTN").unwrap();
		assert_eq!(mtn.priority(), 6);
		assert!(mtn.technologies().contains(&Technology::FourG));
	}

	#[test]
	fn test_disabled_providers_are_skipped() {
		let mut configs = configs();
		configs[1].enabled = false;

		let registry = AdapterFactory::new().create_registry(&configs).unwrap();
		assert_eq!(registry.len(), 2);
		assert!(registry.get("DFA").is_none());
	}

	#[test]
	fn test_invalid_config_is_rejected() {
		let mut configs = configs();
		configs[0].priority = 0;

		let error = AdapterFactory::new().create_registry(&configs).unwrap_err();
		assert!(matches!(error, AdapterError::ConfigError { .. }));
	}

	#[test]
	fn test_duplicate_names_are_rejected() {
		let mut configs = configs();
		configs[2].name = "DFA".to_string();

		assert!(AdapterFactory::new().create_registry(&configs).is_err());
	}
}
