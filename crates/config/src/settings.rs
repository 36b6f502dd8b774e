//! Configuration settings structures

use crate::configurable_value::{ConfigurableValue, ConfigurableValueError};
use bridge_types::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

pub const ACROSS_MAINNET_API_URL: &str = "https://app.across.to/api";
pub const ACROSS_TESTNET_API_URL: &str = "https://testnet.across.to/api";

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
	pub bridge: BridgeSettings,
	pub wallet: WalletSettings,
	/// RPC endpoints keyed by a free-form label (e.g. `base_sepolia`)
	#[serde(default)]
	pub chains: HashMap<String, ChainSettings>,
	pub timeouts: TimeoutSettings,
	pub execution: ExecutionSettings,
	pub logging: LoggingSettings,
}

/// Bridge service settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BridgeSettings {
	/// Use the testnet chain table and API
	pub testnet: bool,
	/// Overrides the Across API base URL derived from `testnet`
	pub api_url: Option<String>,
	pub request_timeout_ms: u64,
	pub retry: RetrySettings,
}

/// Backoff for read-only bridge API calls
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetrySettings {
	/// Total attempts including the first one
	pub max_attempts: u32,
	pub initial_delay_ms: u64,
	pub backoff_multiplier: f64,
	pub max_delay_ms: u64,
}

/// Signing credential and default recipient
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WalletSettings {
	/// Hex private key, e.g. `{ type = "env", value = "PRIVATE_KEY" }`
	pub signing_key: ConfigurableValue,
	/// Recipient used when the caller does not name one
	pub recipient: ConfigurableValue,
}

/// One chain's RPC endpoint
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChainSettings {
	pub chain_id: u64,
	pub rpc_url: ConfigurableValue,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
}

fn default_enabled() -> bool {
	true
}

/// Timeout configuration, all in milliseconds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeoutSettings {
	/// Provider liveness check during initialization
	pub liveness_ms: u64,
	/// Balance, allowance, gas and fee reads
	pub read_ms: u64,
	/// Waiting for a transaction receipt
	pub receipt_ms: u64,
	/// Delay between receipt lookups
	#[serde(default = "default_receipt_poll_ms")]
	pub receipt_poll_ms: u64,
}

fn default_receipt_poll_ms() -> u64 {
	1_000
}

/// Execution behaviour
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExecutionSettings {
	/// Poll the bridge service until the deposit is filled
	pub wait_for_fill: bool,
	pub fill_poll_interval_ms: u64,
	pub fill_timeout_ms: u64,
	/// Confirmations required on approval and deposit receipts
	pub confirmations: u64,
	/// Gas limit assumed for the deposit when estimation is blocked by a pending approval
	pub fallback_deposit_gas: u64,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Settings that cannot be used to start the bridge
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("Failed to load configuration: {0}")]
	Load(#[from] config::ConfigError),

	#[error("Invalid value for {field}: {reason}")]
	InvalidValue { field: String, reason: String },

	#[error("Unresolved value for {field}: {source}")]
	Unresolved {
		field: String,
		#[source]
		source: ConfigurableValueError,
	},

	#[error("Chain {chain_id} is configured more than once")]
	DuplicateChain { chain_id: u64 },
}

impl ConfigError {
	fn unresolved(field: impl Into<String>) -> impl FnOnce(ConfigurableValueError) -> Self {
		let field = field.into();
		move |source| ConfigError::Unresolved { field, source }
	}
}

impl Default for Settings {
	fn default() -> Self {
		let chain = |chain_id: u64, env: &str, enabled: bool| ChainSettings {
			chain_id,
			rpc_url: ConfigurableValue::from_env(env),
			enabled,
		};

		let chains = HashMap::from([
			(
				"ethereum_sepolia".to_string(),
				chain(11155111, "ETHEREUM_SEPOLIA_RPC", true),
			),
			("base_sepolia".to_string(), chain(84532, "BASE_RPC", true)),
			("polygon_mumbai".to_string(), chain(80001, "POLYGON_RPC", false)),
			("arbitrum".to_string(), chain(42161, "ARBITRUM_RPC", false)),
			("optimism".to_string(), chain(10, "OPTIMISM_RPC", false)),
		]);

		Self {
			bridge: BridgeSettings {
				testnet: true,
				api_url: None,
				request_timeout_ms: 10_000,
				retry: RetrySettings {
					max_attempts: 3,
					initial_delay_ms: 250,
					backoff_multiplier: 2.0,
					max_delay_ms: 2_000,
				},
			},
			wallet: WalletSettings {
				signing_key: ConfigurableValue::from_env("PRIVATE_KEY"),
				recipient: ConfigurableValue::from_env("USER_WALLET_ADDRESS"),
			},
			chains,
			timeouts: TimeoutSettings {
				liveness_ms: 5_000,
				read_ms: 10_000,
				receipt_ms: 120_000,
				receipt_poll_ms: default_receipt_poll_ms(),
			},
			execution: ExecutionSettings {
				wait_for_fill: false,
				fill_poll_interval_ms: 5_000,
				fill_timeout_ms: 300_000,
				confirmations: 1,
				fallback_deposit_gas: 200_000,
			},
			logging: LoggingSettings {
				level: "info".to_string(),
				format: LogFormat::Pretty,
				structured: false,
			},
		}
	}
}

impl Settings {
	/// Across API base URL
	pub fn api_url(&self) -> Result<Url, ConfigError> {
		let raw = self.bridge.api_url.as_deref().unwrap_or(if self.bridge.testnet {
			ACROSS_TESTNET_API_URL
		} else {
			ACROSS_MAINNET_API_URL
		});
		Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
			field: "bridge.api_url".to_string(),
			reason: e.to_string(),
		})
	}

	pub fn signing_key(&self) -> Result<SecretString, ConfigError> {
		self.wallet
			.signing_key
			.resolve_secret()
			.map_err(ConfigError::unresolved("wallet.signing_key"))
	}

	pub fn default_recipient(&self) -> Result<String, ConfigError> {
		self.wallet
			.recipient
			.resolve()
			.map_err(ConfigError::unresolved("wallet.recipient"))
	}

	/// Enabled chains only
	pub fn enabled_chains(&self) -> impl Iterator<Item = (&String, &ChainSettings)> {
		self.chains.iter().filter(|(_, chain)| chain.enabled)
	}

	/// Resolve the RPC URL of every enabled chain
	pub fn rpc_urls(&self) -> Result<HashMap<u64, Url>, ConfigError> {
		let mut urls = HashMap::new();
		for (label, chain) in self.enabled_chains() {
			let field = format!("chains.{label}.rpc_url");
			let raw = chain
				.rpc_url
				.resolve()
				.map_err(ConfigError::unresolved(field.clone()))?;
			let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
				field,
				reason: e.to_string(),
			})?;
			if urls.insert(chain.chain_id, url).is_some() {
				return Err(ConfigError::DuplicateChain {
					chain_id: chain.chain_id,
				});
			}
		}
		Ok(urls)
	}

	/// Check everything the bridge needs before it opens any connection
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.api_url()?;
		let key = self.signing_key()?;
		let hex = key.expose_secret();
		let hex = hex.strip_prefix("0x").unwrap_or(hex);
		if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
			return Err(ConfigError::InvalidValue {
				field: "wallet.signing_key".to_string(),
				reason: "expected 32 bytes of hex".to_string(),
			});
		}
		self.default_recipient()?;
		self.rpc_urls()?;

		let retry = &self.bridge.retry;
		if retry.max_attempts == 0 {
			return Err(ConfigError::InvalidValue {
				field: "bridge.retry.max_attempts".to_string(),
				reason: "must be at least 1".to_string(),
			});
		}
		if retry.backoff_multiplier < 1.0 {
			return Err(ConfigError::InvalidValue {
				field: "bridge.retry.backoff_multiplier".to_string(),
				reason: "must be at least 1.0".to_string(),
			});
		}
		if self.timeouts.receipt_poll_ms == 0 {
			return Err(ConfigError::InvalidValue {
				field: "timeouts.receipt_poll_ms".to_string(),
				reason: "must be greater than zero".to_string(),
			});
		}
		if self.execution.fill_poll_interval_ms == 0 {
			return Err(ConfigError::InvalidValue {
				field: "execution.fill_poll_interval_ms".to_string(),
				reason: "must be greater than zero".to_string(),
			});
		}
		Ok(())
	}
}
