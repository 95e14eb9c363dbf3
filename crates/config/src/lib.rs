//! Coverage Configuration
//!
//! Configuration management and startup utilities for the coverage aggregator.

pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use settings::{
	AlertSettings, CacheSettings, ConfigValidationError, EngineSettings, HealthSettings, LogFormat,
	LoggingSettings, MetricsSettings, Settings,
};
pub use startup_logger::{log_engine_ready, log_service_info, log_service_shutdown};
