//! Adapter contract, provider configuration and error taxonomy

pub mod config;
pub mod errors;
pub mod traits;

pub use config::{
	FibreArea, FibreAreaStatus, FibrePolygonConfig, MobileMapConfig, ProviderConfig,
	ProviderConfigError, ProviderKind, TowerRadiusConfig, TowerSite,
};
pub use errors::{AdapterError, ErrorKind};
pub use traits::CoverageAdapter;

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;
