//! Coverage Service
//!
//! Query orchestration for the coverage aggregator: per-provider rate
//! limiting, health tracking, metrics, alerting, and the dispatcher that
//! fans a query out to every adapter and aggregates the answers.

pub mod aggregator;
pub mod alerts;
pub mod dispatcher;
pub mod health;
pub mod metrics;
pub mod provider;
pub mod rate_limiter;

pub use aggregator::{aggregate, compare_technology, ProviderOutcome};
pub use alerts::AlertMonitor;
pub use dispatcher::Dispatcher;
pub use health::HealthMonitor;
pub use metrics::{MetricsCollector, MetricsExportError, CSV_HEADER};
pub use provider::ProviderService;
pub use rate_limiter::{RateLimiter, RateLimiterStats};
