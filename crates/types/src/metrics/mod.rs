//! Metrics collection types
//!
//! Raw data points are appended by the service layer on every adapter
//! invocation and cache lookup; [`MetricsWindow`] is the aggregated view
//! computed over a trailing time window for monitoring and export.

pub mod window;

pub use window::{
	hour_bucket, BreakdownStats, CacheLookupPoint, LatencyStats, MetricsDataPoint,
	MetricsWindow, HOURLY_BUCKET_FORMAT,
	window_start,
};
