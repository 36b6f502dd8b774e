//! Chain IDs, addresses and a ready-to-use bridge over in-memory fakes

use across_bridge::mocks::{FakeBridgeApi, FakeChainClient, FakeConnector};
use across_bridge::{
	Address, AcrossBridge, BridgeBuilder, ExecutorConfig, QuoteEngineConfig, RetryPolicy,
	TransferIntent, U256,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const BASE_SEPOLIA: u64 = 84532;
pub const SEPOLIA: u64 = 11155111;
pub const MUMBAI: u64 = 80001;

pub const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

/// Anvil's first development key
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// 8.5 USDC
pub const USDC_AMOUNT: u64 = 8_500_000;

pub fn usdc_base_sepolia() -> Address {
	Address::from_str("0x036CbD53842c5426634e7929541eC2318f3dCF7e").unwrap()
}

pub fn weth_base_sepolia() -> Address {
	Address::from_str("0x4200000000000000000000000000000000000006").unwrap()
}

pub fn ether(n: u64) -> U256 {
	U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

pub fn usdc_intent(amount: u64) -> TransferIntent {
	TransferIntent::new("USDC", BASE_SEPOLIA, SEPOLIA, U256::from(amount), RECIPIENT)
}

pub fn rpc_urls(chains: &[u64]) -> HashMap<u64, Url> {
	chains
		.iter()
		.map(|chain_id| {
			let url = Url::parse(&format!("http://127.0.0.1:{}", 8000 + chain_id % 1000)).unwrap();
			(*chain_id, url)
		})
		.collect()
}

pub fn fast_quote_config() -> QuoteEngineConfig {
	QuoteEngineConfig {
		read_timeout: Duration::from_secs(1),
		fallback_deposit_gas: 200_000,
		retry: RetryPolicy {
			max_attempts: 3,
			initial_delay: Duration::from_millis(1),
			backoff_multiplier: 2.0,
			max_delay: Duration::from_millis(4),
		},
	}
}

pub fn fast_executor_config() -> ExecutorConfig {
	ExecutorConfig {
		confirmations: 1,
		receipt_timeout: Duration::from_millis(200),
		read_timeout: Duration::from_secs(1),
		wait_for_fill: false,
		fill_poll_interval: Duration::from_millis(10),
		fill_timeout: Duration::from_millis(200),
	}
}

/// Base Sepolia client holding `usdc` USDC and `native` wei
pub fn funded_origin(usdc: u64, native: U256) -> FakeChainClient {
	FakeChainClient::new(BASE_SEPOLIA)
		.with_token_balance(usdc_base_sepolia(), U256::from(usdc))
		.with_native_balance(native)
}

/// A bridge over fakes with Base Sepolia and Sepolia initialized
pub struct Harness {
	pub bridge: AcrossBridge,
	pub origin: Arc<FakeChainClient>,
	pub destination: Arc<FakeChainClient>,
	pub api: Arc<FakeBridgeApi>,
	pub connector: Arc<FakeConnector>,
}

impl Harness {
	pub async fn new(origin: FakeChainClient, api: FakeBridgeApi) -> Self {
		Self::with_executor_config(origin, api, fast_executor_config()).await
	}

	pub async fn with_executor_config(
		origin: FakeChainClient,
		api: FakeBridgeApi,
		executor_config: ExecutorConfig,
	) -> Self {
		let origin = Arc::new(origin);
		let destination = Arc::new(FakeChainClient::new(SEPOLIA));
		let api = Arc::new(api);
		let connector = Arc::new(
			FakeConnector::new()
				.with_client(origin.clone())
				.with_client(destination.clone()),
		);

		let bridge = BridgeBuilder::new(true)
			.with_connector(connector.clone())
			.with_bridge_api(api.clone())
			.with_quote_config(fast_quote_config())
			.with_executor_config(executor_config)
			.build()
			.unwrap();
		let report = bridge
			.initialize_providers(rpc_urls(&[BASE_SEPOLIA, SEPOLIA]))
			.await;
		assert!(report.is_complete());

		Self {
			bridge,
			origin,
			destination,
			api,
			connector,
		}
	}

	/// Funded with 100 USDC and 1 ETH, every route enabled
	pub async fn funded() -> Self {
		Self::new(funded_origin(100_000_000, ether(1)), FakeBridgeApi::new()).await
	}
}
