//! Shared domain models

pub mod coverage;
pub mod geo;
pub mod technology;

pub use coverage::{
	AggregatedResult, CoverageQuery, ProviderComparison, ProviderDescriptor, ProviderResult,
	TechnologyComparison, TechnologyRecommendation, HIGH_CONFIDENCE, LOW_CONFIDENCE,
	MAX_CONFIDENCE, MAX_PRIORITY, MIN_PRIORITY,
};
pub use geo::{
	Coordinates, GeoBounds, GeoError, Polygon, RoundedCoordinate, EARTH_RADIUS_KM,
	MAX_COORDINATE_PRECISION,
};
pub use technology::{Technology, TechnologySet, UnknownTechnology};
