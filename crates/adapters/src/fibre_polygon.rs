//! Fibre coverage by point-in-polygon over mapped footprints

use async_trait::async_trait;
use coverage_types::{
	AdapterResult, Coordinates, CoverageAdapter, FibreArea, FibrePolygonConfig,
	ProviderDescriptor, ProviderResult, Technology,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FibrePolygonAdapter {
	descriptor: ProviderDescriptor,
	areas: Vec<FibreArea>,
}

impl FibrePolygonAdapter {
	pub fn new(name: impl Into<String>, priority: u8, config: FibrePolygonConfig) -> Self {
		Self {
			descriptor: ProviderDescriptor::new(name, [Technology::Fibre], priority),
			areas: config.areas,
		}
	}

	/// Best footprint containing the point; overlapping areas resolve to the
	/// most confident one
	fn best_area(&self, coordinates: &Coordinates) -> Option<&FibreArea> {
		self.areas
			.iter()
			.filter(|area| area.polygon().contains(coordinates))
			.max_by_key(|area| area.confidence())
	}
}

#[async_trait]
impl CoverageAdapter for FibrePolygonAdapter {
	fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	async fn check_coverage(&self, coordinates: Coordinates) -> AdapterResult<ProviderResult> {
		let name = self.descriptor.name.as_str();

		match self.best_area(&coordinates) {
			Some(area) => {
				debug!("{} footprint {} contains {}", name, area.name, coordinates);
				let mut result =
					ProviderResult::covered(name, [Technology::Fibre], area.confidence())
						.with_packages(area.packages.clone())
						.with_note(format!("{} ({:?})", area.name, area.status));
				if let Some(days) = area.install_days {
					result = result.with_install_days(days);
				}
				Ok(result)
			},
			None => Ok(ProviderResult::not_covered(
				name,
				[Technology::Fibre],
				"No fibre footprint at this location",
			)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use coverage_types::{FibreAreaStatus, Polygon};

	fn dfa() -> FibrePolygonAdapter {
		let mut sandton = FibreArea::new(
			"Sandton",
			FibreAreaStatus::Connected,
			Polygon::rectangle(-26.13, 28.03, -26.08, 28.09),
		);
		sandton.packages = vec!["Business Fibre 100Mbps".to_string()];
		sandton.install_days = Some(14);

		let greater = FibreArea::new(
			"Greater Sandton",
			FibreAreaStatus::Ductbank,
			Polygon::rectangle(-26.20, 27.95, -26.00, 28.20),
		);

		FibrePolygonAdapter::new(
			"DFA",
			8,
			FibrePolygonConfig {
				areas: vec![greater, sandton],
			},
		)
	}

	#[tokio::test]
	async fn test_overlapping_areas_pick_most_confident() {
		let result = dfa()
			.check_coverage(Coordinates::new(-26.1076, 28.0567))
			.await
			.unwrap();

		assert!(result.covered);
		assert_eq!(result.confidence, 95);
		assert_eq!(result.estimated_install_days, Some(14));
		assert_eq!(result.available_packages, vec!["Business Fibre 100Mbps"]);
	}

	#[tokio::test]
	async fn test_outer_area_only() {
		let result = dfa()
			.check_coverage(Coordinates::new(-26.02, 28.15))
			.await
			.unwrap();

		assert!(result.covered);
		assert_eq!(result.confidence, 50);
	}

	#[tokio::test]
	async fn test_outside_every_footprint() {
		let result = dfa()
			.check_coverage(Coordinates::new(-33.9249, 18.4241))
			.await
			.unwrap();

		assert!(!result.covered);
		assert_eq!(result.confidence, 0);
		assert!(result.technologies.contains(&Technology::Fibre));
	}
}
