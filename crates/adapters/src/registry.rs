//! Ordered set of registered adapters

use coverage_types::{AdapterError, AdapterResult, CoverageAdapter, ProviderDescriptor, Technology};
use std::sync::Arc;

/// Adapters in registration order
///
/// Registration order is the final tie-break when ranking results, so it is
/// kept stable rather than hashed.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
	adapters: Vec<Arc<dyn CoverageAdapter>>,
}

impl AdapterRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register an adapter; names must be unique
	pub fn register(&mut self, adapter: Arc<dyn CoverageAdapter>) -> AdapterResult<()> {
		if self.get(adapter.name()).is_some() {
			return Err(AdapterError::ConfigError {
				reason: format!("Provider '{}' is already registered", adapter.name()),
			});
		}
		self.adapters.push(adapter);
		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn CoverageAdapter>> {
		self.adapters.iter().find(|adapter| adapter.name() == name)
	}

	/// Position of a provider in registration order
	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.adapters.iter().position(|adapter| adapter.name() == name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn CoverageAdapter>> {
		self.adapters.iter()
	}

	pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
		self.adapters
			.iter()
			.map(|adapter| adapter.descriptor().clone())
			.collect()
	}

	/// Descriptors of providers able to report on `technology`
	pub fn supporting(&self, technology: Technology) -> Vec<ProviderDescriptor> {
		self.adapters
			.iter()
			.filter(|adapter| adapter.descriptor().supports(technology))
			.map(|adapter| adapter.descriptor().clone())
			.collect()
	}

	pub fn len(&self) -> usize {
		self.adapters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.adapters.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{FibrePolygonAdapter, TowerRadiusAdapter};
	use coverage_types::{FibrePolygonConfig, TowerRadiusConfig};

	fn registry() -> AdapterRegistry {
		let mut registry = AdapterRegistry::new();
		registry
			.register(Arc::new(TowerRadiusAdapter::new(
				"CircleTel",
				10,
				TowerRadiusConfig::new(vec![]),
			)))
			.unwrap();
		registry
			.register(Arc::new(FibrePolygonAdapter::new(
				"DFA",
				8,
				FibrePolygonConfig { areas: vec![] },
			)))
			.unwrap();
		registry
	}

	#[test]
	fn test_registration_order_is_kept() {
		let registry = registry();
		let names: Vec<_> = registry.iter().map(|a| a.name().to_string()).collect();
		assert_eq!(names, vec!["CircleTel", "DFA"]);
		assert_eq!(registry.index_of("DFA"), Some(1));
		assert_eq!(registry.index_of("Vuma"), None);
	}

	#[test]
	fn test_duplicate_names_rejected() {
		let mut registry = registry();
		let result = registry.register(Arc::new(FibrePolygonAdapter::new(
			"DFA",
			3,
			FibrePolygonConfig { areas: vec![] },
		)));
		assert!(matches!(result, Err(AdapterError::ConfigError { .. })));
		assert_eq!(registry.len(), 2);
	}

	#[test]
	fn test_supporting_technology() {
		let registry = registry();
		let fibre = registry.supporting(Technology::Fibre);
		assert_eq!(fibre.len(), 1);
		assert_eq!(fibre[0].name, "DFA");
		assert!(registry.supporting(Technology::FiveG).is_empty());
	}
}
