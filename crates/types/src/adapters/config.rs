//! Provider configuration models and validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_SIGNAL_THRESHOLD;
use crate::models::{
	Coordinates, Polygon, ProviderDescriptor, Technology, TechnologySet, MAX_CONFIDENCE,
	MAX_PRIORITY, MIN_PRIORITY,
};

/// Validation errors for a single provider definition
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderConfigError {
	#[error("Provider name must not be empty")]
	EmptyName,

	#[error("Provider '{name}' has priority {priority}, expected 1-10")]
	InvalidPriority { name: String, priority: u8 },

	#[error("Provider '{name}' declares no technologies")]
	NoTechnologies { name: String },

	#[error("Provider '{name}': {reason}")]
	Invalid { name: String, reason: String },
}

/// A provider entry as it appears in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
	/// Unique provider name
	pub name: String,

	/// 1-10, higher wins ties between covered providers
	pub priority: u8,

	#[serde(default = "default_enabled")]
	pub enabled: bool,

	/// Overrides the engine-wide minimum interval between requests
	#[serde(default)]
	pub rate_limit_interval_ms: Option<u64>,

	/// Adapter variant and its settings
	#[serde(flatten)]
	pub kind: ProviderKind,
}

fn default_enabled() -> bool {
	true
}

/// Adapter variants that can be built from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderKind {
	/// Wireless coverage within a radius of known towers
	TowerRadius(TowerRadiusConfig),
	/// Fibre coverage inside mapped network footprints
	FibrePolygon(FibrePolygonConfig),
	/// Mobile coverage from a carrier map service
	MobileMap(MobileMapConfig),
}

impl ProviderKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ProviderKind::TowerRadius(_) => "tower_radius",
			ProviderKind::FibrePolygon(_) => "fibre_polygon",
			ProviderKind::MobileMap(_) => "mobile_map",
		}
	}

	/// Every technology this variant can report
	pub fn technologies(&self) -> TechnologySet {
		match self {
			ProviderKind::TowerRadius(config) => config
				.technologies
				.union(&config.baseline_technologies)
				.copied()
				.collect(),
			ProviderKind::FibrePolygon(_) => [Technology::Fibre].into_iter().collect(),
			ProviderKind::MobileMap(config) => config.variants.iter().copied().collect(),
		}
	}
}

/// One transmission site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerSite {
	pub name: String,
	pub latitude: f64,
	pub longitude: f64,
	pub range_km: f64,
}

impl TowerSite {
	pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, range_km: f64) -> Self {
		Self {
			name: name.into(),
			latitude,
			longitude,
			range_km,
		}
	}

	pub fn coordinates(&self) -> Coordinates {
		Coordinates::new(self.latitude, self.longitude)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerRadiusConfig {
	pub towers: Vec<TowerSite>,

	/// Delivered when the point lies within range of a tower
	#[serde(default = "default_tower_technologies")]
	pub technologies: TechnologySet,

	/// Delivered everywhere in the service area regardless of towers
	#[serde(default)]
	pub baseline_technologies: TechnologySet,

	#[serde(default = "default_in_range_confidence")]
	pub in_range_confidence: u8,

	#[serde(default = "default_baseline_confidence")]
	pub baseline_confidence: u8,

	#[serde(default)]
	pub packages: Vec<String>,

	#[serde(default)]
	pub baseline_packages: Vec<String>,

	#[serde(default)]
	pub install_days: Option<u32>,
}

fn default_tower_technologies() -> TechnologySet {
	[Technology::FixedWireless].into_iter().collect()
}

fn default_in_range_confidence() -> u8 {
	95
}

fn default_baseline_confidence() -> u8 {
	70
}

impl TowerRadiusConfig {
	pub fn new(towers: Vec<TowerSite>) -> Self {
		Self {
			towers,
			technologies: default_tower_technologies(),
			baseline_technologies: TechnologySet::new(),
			in_range_confidence: default_in_range_confidence(),
			baseline_confidence: default_baseline_confidence(),
			packages: Vec::new(),
			baseline_packages: Vec::new(),
			install_days: None,
		}
	}
}

/// Build state of a fibre footprint, which sets its default confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FibreAreaStatus {
	/// Buildings already lit
	Connected,
	/// Fibre passes nearby; a short build is required
	NearNet,
	/// Only duct routes exist
	Ductbank,
}

impl FibreAreaStatus {
	pub fn default_confidence(&self) -> u8 {
		match self {
			FibreAreaStatus::Connected => 95,
			FibreAreaStatus::NearNet => 75,
			FibreAreaStatus::Ductbank => 50,
		}
	}
}

/// One mapped network footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibreArea {
	pub name: String,

	#[serde(default = "default_area_status")]
	pub status: FibreAreaStatus,

	/// Polygon vertices, implicitly closed
	pub vertices: Vec<Coordinates>,

	/// Overrides the status-derived confidence
	#[serde(default)]
	pub confidence: Option<u8>,

	#[serde(default)]
	pub packages: Vec<String>,

	#[serde(default)]
	pub install_days: Option<u32>,
}

fn default_area_status() -> FibreAreaStatus {
	FibreAreaStatus::Connected
}

impl FibreArea {
	pub fn new(name: impl Into<String>, status: FibreAreaStatus, polygon: Polygon) -> Self {
		Self {
			name: name.into(),
			status,
			vertices: polygon.vertices,
			confidence: None,
			packages: Vec::new(),
			install_days: None,
		}
	}

	pub fn polygon(&self) -> Polygon {
		Polygon::new(self.vertices.clone())
	}

	pub fn confidence(&self) -> u8 {
		self.confidence
			.unwrap_or_else(|| self.status.default_confidence())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibrePolygonConfig {
	pub areas: Vec<FibreArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobileMapConfig {
	/// Base URL of the carrier coverage map service
	pub endpoint: String,

	/// Variants tried in order until one answers
	#[serde(default = "default_variants")]
	pub variants: Vec<Technology>,

	/// Signal strength (0-100) below which confidence is degraded
	#[serde(default = "default_signal_threshold")]
	pub signal_threshold: u8,

	/// Suggested when the upstream lists no packages
	#[serde(default = "default_mobile_packages")]
	pub default_packages: Vec<String>,

	#[serde(default)]
	pub headers: Vec<(String, String)>,
}

fn default_variants() -> Vec<Technology> {
	vec![Technology::FourG, Technology::FiveG, Technology::Lte]
}

fn default_signal_threshold() -> u8 {
	DEFAULT_SIGNAL_THRESHOLD
}

fn default_mobile_packages() -> Vec<String> {
	vec![
		"Business 4G 25GB".to_string(),
		"Business 4G 50GB".to_string(),
	]
}

impl MobileMapConfig {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			variants: default_variants(),
			signal_threshold: default_signal_threshold(),
			default_packages: default_mobile_packages(),
			headers: Vec::new(),
		}
	}
}

impl ProviderConfig {
	pub fn new(name: impl Into<String>, priority: u8, kind: ProviderKind) -> Self {
		Self {
			name: name.into(),
			priority,
			enabled: true,
			rate_limit_interval_ms: None,
			kind,
		}
	}

	/// Registration metadata derived from this entry
	pub fn descriptor(&self) -> ProviderDescriptor {
		ProviderDescriptor::new(self.name.clone(), self.kind.technologies(), self.priority)
	}

	/// Validate the provider definition
	pub fn validate(&self) -> Result<(), ProviderConfigError> {
		if self.name.trim().is_empty() {
			return Err(ProviderConfigError::EmptyName);
		}

		if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
			return Err(ProviderConfigError::InvalidPriority {
				name: self.name.clone(),
				priority: self.priority,
			});
		}

		if self.kind.technologies().is_empty() {
			return Err(ProviderConfigError::NoTechnologies {
				name: self.name.clone(),
			});
		}

		let invalid = |reason: String| ProviderConfigError::Invalid {
			name: self.name.clone(),
			reason,
		};

		match &self.kind {
			ProviderKind::TowerRadius(config) => {
				for tower in &config.towers {
					if !tower.coordinates().is_finite() {
						return Err(invalid(format!("tower '{}' has invalid coordinates", tower.name)));
					}
					if !(tower.range_km.is_finite() && tower.range_km > 0.0) {
						return Err(invalid(format!("tower '{}' has non-positive range", tower.name)));
					}
				}
				if config.in_range_confidence == 0 || config.in_range_confidence > MAX_CONFIDENCE {
					return Err(invalid("in_range_confidence must be 1-100".to_string()));
				}
				if !config.baseline_technologies.is_empty()
					&& (config.baseline_confidence == 0 || config.baseline_confidence > MAX_CONFIDENCE)
				{
					return Err(invalid("baseline_confidence must be 1-100".to_string()));
				}
			},
			ProviderKind::FibrePolygon(config) => {
				for area in &config.areas {
					if area.vertices.len() < 3 {
						return Err(invalid(format!("area '{}' needs at least 3 vertices", area.name)));
					}
					if matches!(area.confidence, Some(c) if c == 0 || c > MAX_CONFIDENCE) {
						return Err(invalid(format!("area '{}' confidence must be 1-100", area.name)));
					}
				}
			},
			ProviderKind::MobileMap(config) => {
				if config.endpoint.trim().is_empty() {
					return Err(invalid("endpoint must not be empty".to_string()));
				}
				if config.variants.iter().any(|t| !t.is_mobile()) {
					return Err(invalid("variants must be mobile technologies".to_string()));
				}
				if config.signal_threshold > MAX_CONFIDENCE {
					return Err(invalid("signal_threshold must be 0-100".to_string()));
				}
			},
		}

		Ok(())
	}
}
