//! Configuration mocks and builders for tests

use coverage_aggregator::models::{
	FibreArea, FibreAreaStatus, FibrePolygonConfig, Polygon, ProviderConfig, ProviderKind,
	Technology, TowerRadiusConfig, TowerSite,
};
use coverage_aggregator::Settings;

/// Reference points used across tests
#[allow(dead_code)]
pub struct Locations;

#[allow(dead_code)]
impl Locations {
	pub const JOHANNESBURG: (f64, f64) = (-26.2041, 28.0473);
	pub const CAPE_TOWN: (f64, f64) = (-33.9249, 18.4241);
	pub const DURBAN: (f64, f64) = (-29.8587, 31.0218);
	pub const PRETORIA: (f64, f64) = (-25.7479, 28.2293);
	pub const BLOEMFONTEIN: (f64, f64) = (-29.0852, 26.1596);
	pub const LONDON: (f64, f64) = (51.5074, -0.1278);
}

/// Configuration builders for tests
#[allow(dead_code)]
pub struct MockConfigs;

#[allow(dead_code)]
impl MockConfigs {
	/// Defaults with a short timeout and no rate limiting between calls
	pub fn test_settings() -> Settings {
		let mut settings = Settings::default();
		settings.engine.provider_timeout_ms = 500;
		settings.engine.rate_limit_interval_ms = 0;
		settings.logging.level = "debug".to_string();
		settings
	}

	pub fn with_providers(providers: Vec<ProviderConfig>) -> Settings {
		let mut settings = Self::test_settings();
		settings.providers = providers;
		settings
	}

	/// Wireless provider with a 15 km tower on Johannesburg and LTE everywhere
	pub fn circletel() -> ProviderConfig {
		let (lat, lng) = Locations::JOHANNESBURG;
		let mut tower = TowerRadiusConfig::new(vec![TowerSite::new(
			"Johannesburg CBD",
			lat,
			lng,
			15.0,
		)]);
		tower.baseline_technologies = [Technology::Lte].into_iter().collect();
		tower.packages = vec!["SkyFibre 50Mbps".to_string()];
		ProviderConfig::new("CircleTel", 10, ProviderKind::TowerRadius(tower))
	}

	/// Fibre footprint covering only part of Cape Town
	pub fn openserve_cape_town() -> ProviderConfig {
		ProviderConfig::new(
			"Openserve",
			9,
			ProviderKind::FibrePolygon(FibrePolygonConfig {
				areas: vec![FibreArea::new(
					"Cape Town CBD",
					FibreAreaStatus::Connected,
					Polygon::rectangle(-33.94, 18.40, -33.91, 18.44),
				)],
			}),
		)
	}

	/// Fibre footprint nowhere near the test locations
	pub fn dfa_elsewhere() -> ProviderConfig {
		ProviderConfig::new(
			"DFA",
			8,
			ProviderKind::FibrePolygon(FibrePolygonConfig {
				areas: vec![FibreArea::new(
					"Kimberley",
					FibreAreaStatus::Connected,
					Polygon::rectangle(-28.76, 24.74, -28.72, 24.78),
				)],
			}),
		)
	}
}
