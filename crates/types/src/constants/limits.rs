//! Global limits and defaults for configuration and runtime

/// Default minimum interval between requests to one provider in milliseconds
pub const DEFAULT_RATE_LIMIT_INTERVAL_MS: u64 = 250;

/// Default bound on a single provider invocation in milliseconds
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 8_000; // 8s

/// Minimum allowed provider timeout in milliseconds
pub const MIN_PROVIDER_TIMEOUT_MS: u64 = 100;

/// Maximum allowed provider timeout in milliseconds
pub const MAX_PROVIDER_TIMEOUT_MS: u64 = 60_000; // 60s

/// Maximum interval between requests to one provider in milliseconds
pub const MAX_RATE_LIMIT_INTERVAL_MS: u64 = 60_000; // 60s

/// Upper bound on configured TTLs, windows and retention periods in seconds
pub const MAX_PERIOD_SECS: u64 = 31_536_000; // 365d

/// Default TTL of the per-provider cache tier in seconds
pub const DEFAULT_PROVIDER_CACHE_TTL_SECS: u64 = 1_800; // 30m

/// Default TTL of the aggregate cache tier in seconds
pub const DEFAULT_AGGREGATE_CACHE_TTL_SECS: u64 = 300; // 5m

/// Default interval of the background cache/metrics sweep in seconds
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Default number of decimal places kept when keying on coordinates (~110 m)
pub const DEFAULT_COORDINATE_PRECISION: u32 = 3;

/// Default health rolling window in seconds
pub const DEFAULT_HEALTH_WINDOW_SECS: u64 = 3_600; // 1h

/// Windowed success rate below which a provider is degraded
pub const DEFAULT_DEGRADED_SUCCESS_RATE: f64 = 0.95;

/// Windowed success rate below which a provider is unhealthy
pub const DEFAULT_UNHEALTHY_SUCCESS_RATE: f64 = 0.80;

/// Consecutive failures above which a provider is degraded
pub const DEFAULT_DEGRADED_CONSECUTIVE_FAILURES: u32 = 3;

/// Consecutive failures above which a provider is unhealthy
pub const DEFAULT_UNHEALTHY_CONSECUTIVE_FAILURES: u32 = 10;

/// Samples required in the window before success-rate thresholds apply
pub const DEFAULT_MIN_REQUESTS_FOR_RATE_CHECK: u64 = 10;

/// Default signal strength (0-100) below which mobile confidence is degraded
pub const DEFAULT_SIGNAL_THRESHOLD: u8 = 40;

/// Default number of samples kept per metrics history
pub const DEFAULT_METRICS_MAX_HISTORY: usize = 10_000;

/// Default age after which metrics samples are rolled off, in seconds
pub const DEFAULT_METRICS_RETENTION_SECS: u64 = 86_400; // 24h

/// Invocation latency above which an alert is raised, in milliseconds
pub const DEFAULT_ALERT_MAX_RESPONSE_TIME_MS: u64 = 10_000; // 10s

/// Recent success rate below which an alert is raised
pub const DEFAULT_ALERT_MIN_SUCCESS_RATE: f64 = 0.85;

/// Recent error rate above which an alert is raised
pub const DEFAULT_ALERT_MAX_ERROR_RATE: f64 = 0.15;

/// Failure streak at which an alert is raised
pub const DEFAULT_ALERT_CONSECUTIVE_FAILURES: u32 = 5;

/// Most recent invocations considered for alert rates
pub const DEFAULT_ALERT_RECENT_REQUESTS: usize = 50;

/// Recent invocations needed before alert rates apply
pub const DEFAULT_ALERT_MIN_REQUESTS: usize = 10;

/// Quiet period after an alert for the same provider, in seconds
pub const DEFAULT_ALERT_COOLDOWN_SECS: u64 = 300; // 5m

/// Alerts kept per provider for inspection
pub const DEFAULT_ALERT_HISTORY: usize = 20;

