//! Bridge Configuration
//!
//! Settings, environment-backed values and startup logging for the Across bridge.

pub mod configurable_value;
pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use configurable_value::{ConfigurableValue, ConfigurableValueError, ValueType};
pub use loader::{load_config, load_config_from_toml};
pub use settings::{
	BridgeSettings, ChainSettings, ConfigError, ExecutionSettings, LogFormat, LoggingSettings,
	RetrySettings, Settings, TimeoutSettings, WalletSettings, ACROSS_MAINNET_API_URL,
	ACROSS_TESTNET_API_URL,
};
pub use startup_logger::{log_providers_ready, log_service_info, log_service_shutdown};
