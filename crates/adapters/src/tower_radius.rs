//! Wireless coverage by distance to known towers

use async_trait::async_trait;
use coverage_types::{
	AdapterResult, Coordinates, CoverageAdapter, ProviderDescriptor, ProviderResult,
	TowerRadiusConfig, TowerSite,
};
use tracing::debug;

/// Reports wireless coverage when the point lies within range of a tower
///
/// Baseline technologies (typically LTE) are reported everywhere with a
/// lower confidence, so a provider with a national mobile network still
/// answers outside its tower footprint.
#[derive(Debug, Clone)]
pub struct TowerRadiusAdapter {
	descriptor: ProviderDescriptor,
	config: TowerRadiusConfig,
}

impl TowerRadiusAdapter {
	pub fn new(name: impl Into<String>, priority: u8, config: TowerRadiusConfig) -> Self {
		let technologies = config
			.technologies
			.union(&config.baseline_technologies)
			.copied()
			.collect::<Vec<_>>();
		Self {
			descriptor: ProviderDescriptor::new(name, technologies, priority),
			config,
		}
	}

	/// Closest tower whose range reaches the point
	fn nearest_in_range(&self, coordinates: &Coordinates) -> Option<(&TowerSite, f64)> {
		self.config
			.towers
			.iter()
			.map(|tower| (tower, coordinates.distance_km(&tower.coordinates())))
			.filter(|(tower, distance)| *distance <= tower.range_km)
			.min_by(|a, b| a.1.total_cmp(&b.1))
	}
}

#[async_trait]
impl CoverageAdapter for TowerRadiusAdapter {
	fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	async fn check_coverage(&self, coordinates: Coordinates) -> AdapterResult<ProviderResult> {
		let name = self.descriptor.name.as_str();

		if let Some((tower, distance)) = self.nearest_in_range(&coordinates) {
			debug!(
				"{} covers {} from {} tower ({:.1} km)",
				name, coordinates, tower.name, distance
			);
			let technologies = self
				.config
				.technologies
				.union(&self.config.baseline_technologies)
				.copied()
				.collect::<Vec<_>>();
			let packages = self
				.config
				.packages
				.iter()
				.chain(self.config.baseline_packages.iter())
				.cloned()
				.collect::<Vec<_>>();

			let mut result =
				ProviderResult::covered(name, technologies, self.config.in_range_confidence)
					.with_packages(packages)
					.with_note(format!("Within {:.1} km of the {} tower", distance, tower.name));
			if let Some(days) = self.config.install_days {
				result = result.with_install_days(days);
			}
			return Ok(result);
		}

		if !self.config.baseline_technologies.is_empty() {
			return Ok(ProviderResult::covered(
				name,
				self.config.baseline_technologies.iter().copied(),
				self.config.baseline_confidence,
			)
			.with_packages(self.config.baseline_packages.clone())
			.with_note("Outside tower range, baseline service only"));
		}

		Ok(ProviderResult::not_covered(
			name,
			self.config.technologies.iter().copied(),
			"No tower within range",
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use coverage_types::Technology;

	fn circletel() -> TowerRadiusAdapter {
		let mut config = TowerRadiusConfig::new(vec![
			TowerSite::new("Johannesburg", -26.2041, 28.0473, 15.0),
			TowerSite::new("Cape Town", -33.9249, 18.4241, 12.0),
		]);
		config.baseline_technologies = [Technology::Lte].into_iter().collect();
		config.packages = vec!["SkyFibre 50Mbps".to_string()];
		config.baseline_packages = vec!["Mobile LTE".to_string()];
		config.install_days = Some(1);
		TowerRadiusAdapter::new("CircleTel", 10, config)
	}

	#[tokio::test]
	async fn test_point_in_range_reports_wireless_and_baseline() {
		let adapter = circletel();
		let result = adapter
			.check_coverage(Coordinates::new(-26.2041, 28.0473))
			.await
			.unwrap();

		assert!(result.covered);
		assert_eq!(result.confidence, 95);
		assert!(result.technologies.contains(&Technology::FixedWireless));
		assert!(result.technologies.contains(&Technology::Lte));
		assert_eq!(result.estimated_install_days, Some(1));
		assert_eq!(result.available_packages.len(), 2);
	}

	#[tokio::test]
	async fn test_point_out_of_range_falls_back_to_baseline() {
		let adapter = circletel();
		// Bloemfontein, several hundred km from either tower
		let result = adapter
			.check_coverage(Coordinates::new(-29.0852, 26.1596))
			.await
			.unwrap();

		assert!(result.covered);
		assert_eq!(result.confidence, 70);
		assert_eq!(result.technologies.len(), 1);
		assert!(result.technologies.contains(&Technology::Lte));
	}

	#[tokio::test]
	async fn test_no_baseline_out_of_range_is_not_covered() {
		let adapter = TowerRadiusAdapter::new(
			"Towers",
			5,
			TowerRadiusConfig::new(vec![TowerSite::new("Durban", -29.8587, 31.0218, 10.0)]),
		);
		let result = adapter
			.check_coverage(Coordinates::new(-26.2041, 28.0473))
			.await
			.unwrap();

		assert!(!result.covered);
		assert_eq!(result.confidence, 0);
		assert!(result.note.is_some());
	}

	#[test]
	fn test_descriptor_includes_baseline_technologies() {
		let adapter = circletel();
		assert_eq!(adapter.name(), "CircleTel");
		assert_eq!(adapter.priority(), 10);
		assert_eq!(adapter.technologies().len(), 2);
	}
}
