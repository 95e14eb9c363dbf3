//! Service startup logging for the coverage aggregator

use std::env;
use tracing::info;

/// Logs service information at startup
pub fn log_service_info() {
	let service_name = "coverage-aggregator";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== Coverage Aggregator Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);
	info!("💻 Platform: {} ({})", env::consts::OS, env::consts::ARCH);

	if let Ok(cwd) = env::current_dir() {
		info!("📁 Working Directory: {}", cwd.display());
	}

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}

	if let Ok(config_path) = env::var("CONFIG_PATH") {
		info!("📋 Config Path: {}", config_path);
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the registered providers once the engine is built
pub fn log_engine_ready(providers: &[String]) {
	info!("✅ Coverage engine ready");
	info!("📡 {} provider(s): {}", providers.len(), providers.join(", "));
}

/// Logs service shutdown information
pub fn log_service_shutdown() {
	info!("🛑 Coverage Aggregator Shutting Down");
	info!(
		"🕒 Shutdown at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}
