//! Across Bridge Library
//!
//! Cross-chain token transfers through the Across bridge. Every transfer can
//! be simulated with a read-only dry run before any funds move, and every
//! failure is classified into a small closed set of kinds.

use bridge_adapters::{AcrossClient, EvmConnector, DEFAULT_RECEIPT_POLL_INTERVAL};
use bridge_config::{
	log_providers_ready, log_service_shutdown, ConfigError, LogFormat, LoggingSettings,
	RetrySettings, Settings, ACROSS_MAINNET_API_URL, ACROSS_TESTNET_API_URL,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

// Core domain types
pub use bridge_types::{
	chrono, Address, BridgeApi, BridgeApiError, BridgeError, BridgeResult, ChainClient,
	ChainConnector, ChainDescriptor, ChainError, DepositStatus, ErrorClassification, ErrorKind,
	ExecutionResult, ExecutionStage, ExecutionStatus, FeeBreakdown, FillStatus, ProviderError,
	Quote, QuoteFailureReason, SecretString, TokenDescriptor, TransferIntent, TxHash, U256,
};

// Service layer
pub use bridge_service::{
	BridgeExecutor, ChainRegistry, ErrorClassifier, ExecutorConfig, ProviderHandle,
	ProviderInitReport, ProviderPool, QuoteEngine, QuoteEngineConfig, RetryPolicy,
};

// Config
pub use bridge_config::{load_config, log_service_info};

pub mod types {
	pub use bridge_types::*;
}

pub mod config {
	pub use bridge_config::*;
}

pub mod adapters {
	pub use bridge_adapters::*;
}

pub mod service {
	pub use bridge_service::*;
}

pub mod mocks;

const TRACING_TARGET: &str = "across_bridge";

/// Entry point for dry runs and transfers
///
/// Owns the provider pool; the quote engine and executor borrow it for every
/// call.
#[derive(Debug)]
pub struct AcrossBridge {
	pool: ProviderPool,
	quotes: QuoteEngine,
	executor: BridgeExecutor,
	testnet: bool,
}

impl AcrossBridge {
	/// Bridge with the built-in chain table and the public Across API
	pub fn new(signing_key: SecretString, testnet: bool) -> BridgeResult<Self> {
		BridgeBuilder::new(testnet).with_signing_key(signing_key).build()
	}

	/// Bridge configured from validated settings
	pub fn from_settings(settings: &Settings) -> BridgeResult<Self> {
		BridgeBuilder::from_settings(settings)
			.map_err(configuration_error)?
			.build()
	}

	pub fn builder(testnet: bool) -> BridgeBuilder {
		BridgeBuilder::new(testnet)
	}

	pub fn is_testnet(&self) -> bool {
		self.testnet
	}

	pub fn registry(&self) -> &Arc<ChainRegistry> {
		self.pool.registry()
	}

	pub fn pool(&self) -> &ProviderPool {
		&self.pool
	}

	/// Connect to every chain in `rpc_urls`; unreachable chains are reported, not fatal
	pub async fn initialize_providers(&self, rpc_urls: HashMap<u64, Url>) -> ProviderInitReport {
		let report = self.pool.initialize(rpc_urls).await;
		log_providers_ready(&report.ready, &report.failed_chains());
		report
	}

	pub fn get_provider(&self, chain_id: u64) -> BridgeResult<ProviderHandle> {
		Ok(self.pool.get_provider(chain_id)?)
	}

	/// Price and validate a transfer without submitting anything
	pub async fn dry_run(&self, intent: &TransferIntent) -> Quote {
		self.quotes.dry_run(&self.pool, intent).await
	}

	/// Re-validate and execute a transfer
	pub async fn execute_dynamic_bridge(
		&self,
		intent: &TransferIntent,
	) -> BridgeResult<ExecutionResult> {
		self.executor.execute_dynamic_bridge(&self.pool, intent).await
	}

	/// Track a submitted transfer until it is filled, fails, or `timeout` elapses
	pub async fn wait_for_fill(
		&self,
		result: ExecutionResult,
		timeout: Duration,
	) -> ExecutionResult {
		self.executor.wait_for_fill(result, timeout).await
	}

	/// Classify a failure and log it with its remediation
	pub fn handle_bridge_error(&self, err: &BridgeError) -> ErrorClassification {
		let classification = ErrorClassifier::classify(err);
		error!(
			target: TRACING_TARGET,
			kind = %classification.kind,
			retryable = classification.retryable,
			stage = ?err.stage(),
			"Bridge operation failed: {}",
			classification.message
		);
		info!(target: TRACING_TARGET, "Suggested action: {}", classification.remediation);
		classification
	}

	/// Execute a transfer described by its parts
	pub async fn simple_bridge(
		&self,
		token_symbol: &str,
		origin_chain_id: u64,
		destination_chain_id: u64,
		amount: U256,
		recipient: &str,
	) -> BridgeResult<ExecutionResult> {
		let intent = TransferIntent::new(
			token_symbol,
			origin_chain_id,
			destination_chain_id,
			amount,
			recipient,
		);
		info!(
			target: TRACING_TARGET,
			token = token_symbol,
			origin = origin_chain_id,
			destination = destination_chain_id,
			%amount,
			"Bridging"
		);
		self.execute_dynamic_bridge(&intent).await
	}

	/// Close every chain connection
	pub async fn shutdown(&self) {
		self.pool.shutdown().await;
		log_service_shutdown();
	}
}

/// Assembles an [`AcrossBridge`], allowing any seam to be replaced
pub struct BridgeBuilder {
	testnet: bool,
	signing_key: Option<SecretString>,
	registry: Option<ChainRegistry>,
	connector: Option<Arc<dyn ChainConnector>>,
	bridge_api: Option<Arc<dyn BridgeApi>>,
	api_url: Option<Url>,
	request_timeout: Duration,
	liveness_timeout: Duration,
	receipt_poll_interval: Duration,
	quote_config: QuoteEngineConfig,
	executor_config: ExecutorConfig,
}

impl fmt::Debug for BridgeBuilder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BridgeBuilder")
			.field("testnet", &self.testnet)
			.field("signing_key", &self.signing_key)
			.field("custom_registry", &self.registry.is_some())
			.field("custom_connector", &self.connector.is_some())
			.field("custom_bridge_api", &self.bridge_api.is_some())
			.field("api_url", &self.api_url)
			.field("receipt_poll_interval", &self.receipt_poll_interval)
			.finish()
	}
}

impl BridgeBuilder {
	pub fn new(testnet: bool) -> Self {
		Self {
			testnet,
			signing_key: None,
			registry: None,
			connector: None,
			bridge_api: None,
			api_url: None,
			request_timeout: Duration::from_secs(10),
			liveness_timeout: Duration::from_secs(5),
			receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
			quote_config: QuoteEngineConfig::default(),
			executor_config: ExecutorConfig::default(),
		}
	}

	/// Builder carrying every tunable from `settings`
	///
	/// Settings are validated first so a bad configuration fails before any
	/// connection is attempted.
	pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
		settings.validate()?;

		let timeouts = &settings.timeouts;
		let execution = &settings.execution;
		let read_timeout = Duration::from_millis(timeouts.read_ms);

		Ok(Self::new(settings.bridge.testnet)
			.with_signing_key(settings.signing_key()?)
			.with_api_url(settings.api_url()?)
			.with_request_timeout(Duration::from_millis(settings.bridge.request_timeout_ms))
			.with_liveness_timeout(Duration::from_millis(timeouts.liveness_ms))
			.with_receipt_poll_interval(Duration::from_millis(timeouts.receipt_poll_ms))
			.with_quote_config(QuoteEngineConfig {
				read_timeout,
				fallback_deposit_gas: execution.fallback_deposit_gas,
				retry: retry_policy(&settings.bridge.retry),
			})
			.with_executor_config(ExecutorConfig {
				confirmations: execution.confirmations,
				receipt_timeout: Duration::from_millis(timeouts.receipt_ms),
				read_timeout,
				wait_for_fill: execution.wait_for_fill,
				fill_poll_interval: Duration::from_millis(execution.fill_poll_interval_ms),
				fill_timeout: Duration::from_millis(execution.fill_timeout_ms),
			}))
	}

	pub fn with_signing_key(mut self, signing_key: SecretString) -> Self {
		self.signing_key = Some(signing_key);
		self
	}

	/// Replace the built-in chain table
	pub fn with_registry(mut self, registry: ChainRegistry) -> Self {
		self.registry = Some(registry);
		self
	}

	/// Replace the alloy connector, e.g. with an in-memory fake
	pub fn with_connector(mut self, connector: Arc<dyn ChainConnector>) -> Self {
		self.connector = Some(connector);
		self
	}

	/// Replace the Across HTTP client
	pub fn with_bridge_api(mut self, bridge_api: Arc<dyn BridgeApi>) -> Self {
		self.bridge_api = Some(bridge_api);
		self
	}

	pub fn with_api_url(mut self, api_url: Url) -> Self {
		self.api_url = Some(api_url);
		self
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn with_liveness_timeout(mut self, timeout: Duration) -> Self {
		self.liveness_timeout = timeout;
		self
	}

	/// Delay between receipt lookups on the alloy connector
	pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
		self.receipt_poll_interval = interval;
		self
	}

	pub fn receipt_poll_interval(&self) -> Duration {
		self.receipt_poll_interval
	}

	pub fn with_quote_config(mut self, config: QuoteEngineConfig) -> Self {
		self.quote_config = config;
		self
	}

	pub fn with_executor_config(mut self, config: ExecutorConfig) -> Self {
		self.executor_config = config;
		self
	}

	pub fn build(self) -> BridgeResult<AcrossBridge> {
		let registry = match self.registry {
			Some(registry) => registry,
			None => ChainRegistry::for_network(self.testnet)?,
		};

		let connector: Arc<dyn ChainConnector> = match (self.connector, &self.signing_key) {
			(Some(connector), _) => connector,
			(None, Some(key)) => Arc::new(
				EvmConnector::new(key)?.with_receipt_poll_interval(self.receipt_poll_interval),
			),
			(None, None) => {
				return Err(BridgeError::Configuration {
					reason: "a signing key or a chain connector is required".to_string(),
				});
			},
		};

		let bridge_api: Arc<dyn BridgeApi> = match self.bridge_api {
			Some(api) => api,
			None => {
				let api_url = match self.api_url {
					Some(url) => url,
					None => default_api_url(self.testnet)?,
				};
				Arc::new(AcrossClient::new(api_url, self.request_timeout)?)
			},
		};

		let pool = ProviderPool::new(Arc::new(registry), connector, self.liveness_timeout);
		let quotes = QuoteEngine::new(bridge_api, self.quote_config);
		let executor = BridgeExecutor::new(quotes.clone(), self.executor_config);

		Ok(AcrossBridge {
			pool,
			quotes,
			executor,
			testnet: self.testnet,
		})
	}
}

fn default_api_url(testnet: bool) -> BridgeResult<Url> {
	let raw = if testnet {
		ACROSS_TESTNET_API_URL
	} else {
		ACROSS_MAINNET_API_URL
	};
	Url::parse(raw).map_err(configuration_error)
}

fn configuration_error(e: impl fmt::Display) -> BridgeError {
	BridgeError::Configuration {
		reason: e.to_string(),
	}
}

/// Retry policy described by `settings`
pub fn retry_policy(settings: &RetrySettings) -> RetryPolicy {
	RetryPolicy {
		max_attempts: settings.max_attempts,
		initial_delay: Duration::from_millis(settings.initial_delay_ms),
		backoff_multiplier: settings.backoff_multiplier,
		max_delay: Duration::from_millis(settings.max_delay_ms),
	}
}

/// Install the global tracing subscriber described by `settings`
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(
	settings: &LoggingSettings,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.level));

	match settings.format {
		LogFormat::Json => {
			let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);
			if settings.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()?;
			} else {
				subscriber.try_init()?;
			}
		},
		LogFormat::Pretty => {
			let subscriber = tracing_subscriber::fmt()
				.pretty()
				.with_env_filter(env_filter);
			if settings.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()?;
			} else {
				subscriber.try_init()?;
			}
		},
		LogFormat::Compact => {
			let subscriber = tracing_subscriber::fmt()
				.compact()
				.with_env_filter(env_filter);
			if settings.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()?;
			} else {
				subscriber.try_init()?;
			}
		},
	}

	info!(
		"Logging configuration applied: level={}, format={:?}, structured={}",
		settings.level, settings.format, settings.structured
	);
	Ok(())
}
