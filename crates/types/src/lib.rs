//! Coverage Types
//!
//! Shared models and traits for the coverage aggregation engine.
//! This crate contains the domain models, the adapter contract and the
//! health and metrics types read by monitoring.

pub mod adapters;
pub mod constants;
pub mod health;
pub mod metrics;
pub mod models;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

pub use adapters::{
	AdapterError, AdapterResult, CoverageAdapter, ErrorKind, FibreArea, FibreAreaStatus,
	FibrePolygonConfig, MobileMapConfig, ProviderConfig, ProviderConfigError, ProviderKind,
	TowerRadiusConfig, TowerSite,
};

pub use health::{HealthRecord, HealthStatus, ProviderAlert};

pub use metrics::{
	window_start, BreakdownStats, CacheLookupPoint, LatencyStats, MetricsDataPoint, MetricsWindow,
};

pub use models::{
	AggregatedResult, Coordinates, CoverageQuery, GeoBounds, GeoError, Polygon,
	ProviderComparison, ProviderDescriptor, ProviderResult, RoundedCoordinate, Technology,
	TechnologyComparison, TechnologyRecommendation, TechnologySet, UnknownTechnology,
};
