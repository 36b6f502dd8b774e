//! Startup and shutdown logging for the bridge

use crate::settings::Settings;
use std::env;
use tracing::{info, warn};

/// Logs service information and the effective (non-secret) configuration
pub fn log_service_info(settings: &Settings) {
	let service_name = "across-bridge";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== Across Bridge Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);
	info!("💻 Platform: {} ({})", env::consts::OS, env::consts::ARCH);

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}

	info!(
		"🌉 Network: {}",
		if settings.bridge.testnet {
			"testnet"
		} else {
			"mainnet"
		}
	);
	match settings.api_url() {
		Ok(url) => info!("📡 Bridge API: {}", url),
		Err(e) => warn!("📡 Bridge API: {}", e),
	}
	info!("🔑 Signing key: {}", settings.wallet.signing_key.description());
	if settings.wallet.signing_key.is_inline() {
		warn!("⚠️ Signing key is written inline in the configuration");
	}

	let mut chains: Vec<_> = settings.enabled_chains().collect();
	chains.sort_by_key(|(_, chain)| chain.chain_id);
	for (label, chain) in chains {
		info!("⛓️ Chain {} ({}): rpc from {}", chain.chain_id, label, chain.rpc_url);
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the outcome of provider initialization
pub fn log_providers_ready(ready: &[u64], failed: &[u64]) {
	info!("✅ Providers ready for chains {:?}", ready);
	if !failed.is_empty() {
		warn!("❌ Providers unavailable for chains {:?}", failed);
	}
}

/// Logs service shutdown information
pub fn log_service_shutdown() {
	info!("🛑 Across Bridge Shutting Down");
	info!(
		"🕒 Shutdown at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}
