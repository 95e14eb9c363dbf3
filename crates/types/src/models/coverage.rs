//! Coverage query and result models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::geo::{Coordinates, GeoBounds, GeoError};
use super::technology::{Technology, TechnologySet};

/// Lowest and highest provider priority accepted at registration
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

/// Highest confidence score
pub const MAX_CONFIDENCE: u8 = 100;

/// Confidence at or above which coverage is reported as high confidence
pub const HIGH_CONFIDENCE: u8 = 80;

/// Confidence below which covered results are reported as low confidence
pub const LOW_CONFIDENCE: u8 = 40;

/// A coverage lookup for one location
///
/// `address` is carried for display only and never takes part in cache keying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageQuery {
	pub latitude: f64,
	pub longitude: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
}

impl CoverageQuery {
	pub fn new(latitude: f64, longitude: f64) -> Self {
		Self {
			latitude,
			longitude,
			address: None,
		}
	}

	pub fn with_address(mut self, address: impl Into<String>) -> Self {
		self.address = Some(address.into());
		self
	}

	pub fn coordinates(&self) -> Coordinates {
		Coordinates::new(self.latitude, self.longitude)
	}

	pub fn validate(&self, bounds: &GeoBounds) -> Result<(), GeoError> {
		bounds.validate(&self.coordinates())
	}
}

/// Static description of a registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
	/// Unique provider name
	pub name: String,
	/// Technologies this provider can report on
	pub supported_technologies: TechnologySet,
	/// Tie-break weight when several providers cover a point (higher wins)
	pub priority: u8,
}

impl ProviderDescriptor {
	/// Create a descriptor; priority is clamped into 1..=10
	pub fn new(
		name: impl Into<String>,
		technologies: impl IntoIterator<Item = Technology>,
		priority: u8,
	) -> Self {
		Self {
			name: name.into(),
			supported_technologies: technologies.into_iter().collect(),
			priority: priority.clamp(MIN_PRIORITY, MAX_PRIORITY),
		}
	}

	/// First technology in canonical order, used as the cache discriminator
	pub fn primary_technology(&self) -> Option<Technology> {
		self.supported_technologies.iter().next().copied()
	}

	pub fn supports(&self, technology: Technology) -> bool {
		self.supported_technologies.contains(&technology)
	}
}

/// One provider's answer for one location
///
/// Non-covered results always carry a confidence of 0 and covered results a
/// confidence of at least 1; the constructors enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
	pub provider: String,
	pub technologies: TechnologySet,
	pub covered: bool,
	pub confidence: u8,
	pub available_packages: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub estimated_install_days: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub note: Option<String>,
}

impl ProviderResult {
	/// Positive result; confidence is clamped into 1..=100
	pub fn covered(
		provider: impl Into<String>,
		technologies: impl IntoIterator<Item = Technology>,
		confidence: u8,
	) -> Self {
		Self {
			provider: provider.into(),
			technologies: technologies.into_iter().collect(),
			covered: true,
			confidence: confidence.clamp(1, MAX_CONFIDENCE),
			available_packages: Vec::new(),
			estimated_install_days: None,
			note: None,
		}
	}

	/// Negative result: valid answer, no service at this location
	pub fn not_covered(
		provider: impl Into<String>,
		technologies: impl IntoIterator<Item = Technology>,
		note: impl Into<String>,
	) -> Self {
		Self {
			provider: provider.into(),
			technologies: technologies.into_iter().collect(),
			covered: false,
			confidence: 0,
			available_packages: Vec::new(),
			estimated_install_days: None,
			note: Some(note.into()),
		}
	}

	/// Result standing in for a failed or timed-out invocation
	pub fn failure(descriptor: &ProviderDescriptor, note: impl Into<String>) -> Self {
		Self::not_covered(
			descriptor.name.clone(),
			descriptor.supported_technologies.iter().copied(),
			note,
		)
	}

	pub fn with_packages<I, S>(mut self, packages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.available_packages = packages.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_install_days(mut self, days: u32) -> Self {
		self.estimated_install_days = Some(days);
		self
	}

	pub fn with_note(mut self, note: impl Into<String>) -> Self {
		self.note = Some(note.into());
		self
	}

	/// Zero confidence exactly when not covered
	pub fn is_consistent(&self) -> bool {
		(self.confidence == 0) == !self.covered
	}
}

/// Combined answer across every registered provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
	pub query: CoverageQuery,
	pub generated_at: DateTime<Utc>,
	pub covered_any: bool,
	pub union_technologies: TechnologySet,
	pub best_provider: Option<ProviderResult>,
	pub alternatives: Vec<ProviderResult>,
	pub overall_confidence: u8,
	/// Preferred provider per covered technology
	#[serde(default)]
	pub by_technology: BTreeMap<Technology, TechnologyRecommendation>,
	/// Every provider's result in registration order, failures included
	pub providers: Vec<ProviderResult>,
}

impl AggregatedResult {
	pub fn best_provider_name(&self) -> Option<&str> {
		self.best_provider.as_ref().map(|r| r.provider.as_str())
	}

	/// Look up one provider's contribution by name
	pub fn provider(&self, name: &str) -> Option<&ProviderResult> {
		self.providers.iter().find(|r| r.provider == name)
	}

	pub fn recommendation(&self, technology: Technology) -> Option<&TechnologyRecommendation> {
		self.by_technology.get(&technology)
	}

	/// Same answer reported against another query in the same cell
	pub fn with_query(&self, query: CoverageQuery) -> Self {
		Self {
			query,
			..self.clone()
		}
	}
}

/// Ranked providers covering one technology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyRecommendation {
	pub technology: Technology,
	pub recommended: String,
	/// Remaining covering providers, best first
	pub alternatives: Vec<String>,
}

/// How one provider fares for a technology at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderComparison {
	pub provider: String,
	/// Whether this provider covers the compared technology here
	pub available: bool,
	pub confidence: u8,
	pub pros: Vec<String>,
	pub cons: Vec<String>,
}

/// Side-by-side view of every provider able to deliver one technology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyComparison {
	pub technology: Technology,
	/// Available providers in rank order, then the rest in registration order
	pub providers: Vec<ProviderComparison>,
}

impl TechnologyComparison {
	pub fn available(&self) -> impl Iterator<Item = &ProviderComparison> {
		self.providers.iter().filter(|p| p.available)
	}
}
