//! Provider pool
//!
//! Holds one live connection per chain. Initialization runs per chain
//! concurrently and a failure on one chain never blocks the others. Reads are
//! lock-free; writes for the same chain are serialized.

use crate::registry::ChainRegistry;
use bridge_types::{ChainClient, ChainConnector, ChainError, ProviderError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

const TRACING_TARGET: &str = "bridge_service::provider_pool";

/// A validated connection to one chain
#[derive(Debug, Clone)]
pub struct ProviderHandle {
	pub chain_id: u64,
	pub rpc_endpoint: Url,
	pub client: Arc<dyn ChainClient>,
	/// Block height observed by the liveness check
	pub block_at_init: u64,
	pub initialized_at: DateTime<Utc>,
}

/// Outcome of [`ProviderPool::initialize`]
#[derive(Debug, Default)]
pub struct ProviderInitReport {
	/// Chains with a live handle, ascending
	pub ready: Vec<u64>,
	/// Chains whose connection or liveness check failed
	pub failed: Vec<ProviderError>,
}

impl ProviderInitReport {
	pub fn is_complete(&self) -> bool {
		self.failed.is_empty()
	}

	pub fn failed_chains(&self) -> Vec<u64> {
		self.failed.iter().map(ProviderError::chain_id).collect()
	}
}

/// Per-chain connection handles keyed by chain ID
#[derive(Debug)]
pub struct ProviderPool {
	registry: Arc<ChainRegistry>,
	connector: Arc<dyn ChainConnector>,
	handles: DashMap<u64, ProviderHandle>,
	write_locks: DashMap<u64, Arc<Mutex<()>>>,
	liveness_timeout: Duration,
}

impl ProviderPool {
	pub fn new(
		registry: Arc<ChainRegistry>,
		connector: Arc<dyn ChainConnector>,
		liveness_timeout: Duration,
	) -> Self {
		Self {
			registry,
			connector,
			handles: DashMap::new(),
			write_locks: DashMap::new(),
			liveness_timeout,
		}
	}

	pub fn registry(&self) -> &Arc<ChainRegistry> {
		&self.registry
	}

	/// Connect to every endpoint and keep the ones that pass the liveness check
	///
	/// Re-initializing a chain replaces its handle (shutting the old one down);
	/// a failed re-initialization removes the stale handle.
	pub async fn initialize(&self, rpc_urls: HashMap<u64, Url>) -> ProviderInitReport {
		let tasks = rpc_urls
			.into_iter()
			.map(|(chain_id, url)| self.initialize_chain(chain_id, url));

		let mut report = ProviderInitReport::default();
		for result in join_all(tasks).await {
			match result {
				Ok(chain_id) => report.ready.push(chain_id),
				Err(e) => report.failed.push(e),
			}
		}
		report.ready.sort_unstable();
		report.failed.sort_by_key(ProviderError::chain_id);

		info!(
			target: TRACING_TARGET,
			ready = ?report.ready,
			failed = ?report.failed_chains(),
			"Provider initialization finished"
		);
		report
	}

	async fn initialize_chain(&self, chain_id: u64, url: Url) -> Result<u64, ProviderError> {
		let lock = self
			.write_locks
			.entry(chain_id)
			.or_insert_with(|| Arc::new(Mutex::new(())))
			.clone();
		let _guard = lock.lock().await;

		match self.connect_and_probe(chain_id, &url).await {
			Ok(handle) => {
				debug!(
					target: TRACING_TARGET,
					chain_id,
					block = handle.block_at_init,
					"Provider is live"
				);
				if let Some(previous) = self.handles.insert(chain_id, handle) {
					previous.client.shutdown().await;
				}
				Ok(chain_id)
			},
			Err(cause) => {
				warn!(
					target: TRACING_TARGET,
					chain_id,
					"Provider initialization failed: {}",
					cause
				);
				if let Some((_, stale)) = self.handles.remove(&chain_id) {
					stale.client.shutdown().await;
				}
				Err(ProviderError::Init { chain_id, cause })
			},
		}
	}

	async fn connect_and_probe(
		&self,
		chain_id: u64,
		url: &Url,
	) -> Result<ProviderHandle, ChainError> {
		let chain = self
			.registry
			.resolve_chain(chain_id)
			.map_err(|e| ChainError::InvalidEndpoint {
				chain_id,
				reason: e.to_string(),
			})?;

		let timeout_ms = u64::try_from(self.liveness_timeout.as_millis()).unwrap_or(u64::MAX);
		let probe = async {
			let client = self.connector.connect(chain, url).await?;
			match client.block_number().await {
				Ok(block) => Ok((client, block)),
				Err(e) => {
					client.shutdown().await;
					Err(e)
				},
			}
		};

		let (client, block_at_init) = tokio::time::timeout(self.liveness_timeout, probe)
			.await
			.map_err(|_| ChainError::timeout(chain_id, "liveness check", timeout_ms))??;

		Ok(ProviderHandle {
			chain_id,
			rpc_endpoint: url.clone(),
			client,
			block_at_init,
			initialized_at: Utc::now(),
		})
	}

	/// Live handle for `chain_id`
	pub fn get_provider(&self, chain_id: u64) -> Result<ProviderHandle, ProviderError> {
		self.handles
			.get(&chain_id)
			.map(|entry| entry.value().clone())
			.ok_or(ProviderError::NotConfigured { chain_id })
	}

	/// Chains with a live handle, ascending
	pub fn configured_chains(&self) -> Vec<u64> {
		let mut chains: Vec<u64> = self.handles.iter().map(|entry| *entry.key()).collect();
		chains.sort_unstable();
		chains
	}

	/// Drop every handle, shutting each connection down
	pub async fn shutdown(&self) {
		for chain_id in self.configured_chains() {
			let lock = self
				.write_locks
				.entry(chain_id)
				.or_insert_with(|| Arc::new(Mutex::new(())))
				.clone();
			let _guard = lock.lock().await;
			if let Some((_, handle)) = self.handles.remove(&chain_id) {
				handle.client.shutdown().await;
				debug!(target: TRACING_TARGET, chain_id, "Provider shut down");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use bridge_types::{
		Address, ChainDescriptor, ChainResult, DepositCall, TransactionOutcome, TxHash, U256,
	};
	use std::sync::atomic::{AtomicUsize, Ordering};

	mockall::mock! {
		pub Client {}

		#[async_trait]
		impl ChainClient for Client {
			fn chain_id(&self) -> u64;
			fn signer_address(&self) -> Address;
			async fn block_number(&self) -> ChainResult<u64>;
			async fn native_balance(&self, owner: Address) -> ChainResult<U256>;
			async fn token_balance(&self, token: Address, owner: Address) -> ChainResult<U256>;
			async fn allowance(&self, token: Address, owner: Address, spender: Address) -> ChainResult<U256>;
			async fn gas_price(&self) -> ChainResult<u128>;
			async fn estimate_approval_gas(&self, token: Address, spender: Address, amount: U256) -> ChainResult<u64>;
			async fn estimate_deposit_gas(&self, deposit: &DepositCall) -> ChainResult<u64>;
			async fn submit_approval(&self, token: Address, spender: Address, amount: U256) -> ChainResult<TxHash>;
			async fn submit_deposit(&self, deposit: &DepositCall) -> ChainResult<TxHash>;
			async fn wait_for_confirmations(&self, tx_hash: TxHash, confirmations: u64, timeout: Duration) -> ChainResult<TransactionOutcome>;
			async fn shutdown(&self);
		}
	}

	mockall::mock! {
		pub Connector {}

		#[async_trait]
		impl ChainConnector for Connector {
			async fn connect(&self, chain: &ChainDescriptor, rpc_url: &Url) -> ChainResult<Arc<dyn ChainClient>>;
		}
	}

	impl std::fmt::Debug for MockClient {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			f.write_str("MockClient")
		}
	}

	impl std::fmt::Debug for MockConnector {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			f.write_str("MockConnector")
		}
	}

	fn live_client(chain_id: u64, block: u64, shutdowns: Arc<AtomicUsize>) -> Arc<dyn ChainClient> {
		let mut client = MockClient::new();
		client.expect_chain_id().return_const(chain_id);
		client.expect_block_number().returning(move || Ok(block));
		client.expect_shutdown().returning(move || {
			shutdowns.fetch_add(1, Ordering::SeqCst);
		});
		Arc::new(client)
	}

	fn url(port: u16) -> Url {
		Url::parse(&format!("http://127.0.0.1:{port}")).unwrap()
	}

	fn pool(connector: MockConnector) -> ProviderPool {
		ProviderPool::new(
			Arc::new(ChainRegistry::testnet().unwrap()),
			Arc::new(connector),
			Duration::from_millis(200),
		)
	}

	#[tokio::test]
	async fn test_unreachable_chain_does_not_block_others() {
		let shutdowns = Arc::new(AtomicUsize::new(0));
		let mut connector = MockConnector::new();
		let counter = shutdowns.clone();
		connector.expect_connect().returning(move |chain, _| {
			if chain.chain_id == 80001 {
				Err(ChainError::Transport {
					chain_id: 80001,
					reason: "connection refused".to_string(),
				})
			} else {
				Ok(live_client(chain.chain_id, 100, counter.clone()))
			}
		});

		let pool = pool(connector);
		let report = pool
			.initialize(HashMap::from([(84532, url(1)), (11155111, url(2)), (80001, url(3))]))
			.await;

		assert_eq!(report.ready, vec![84532, 11155111]);
		assert_eq!(report.failed_chains(), vec![80001]);
		assert!(!report.is_complete());

		assert_eq!(pool.get_provider(84532).unwrap().block_at_init, 100);
		assert!(matches!(
			pool.get_provider(80001),
			Err(ProviderError::NotConfigured { chain_id: 80001 })
		));
	}

	#[tokio::test]
	async fn test_liveness_failure_is_reported() {
		let mut connector = MockConnector::new();
		connector.expect_connect().returning(|_, _| {
			let mut client = MockClient::new();
			client.expect_block_number().returning(|| {
				Err(ChainError::Rejected {
					chain_id: 84532,
					code: -32601,
					message: "method not found".to_string(),
				})
			});
			client.expect_shutdown().return_const(());
			Ok(Arc::new(client) as Arc<dyn ChainClient>)
		});

		let pool = pool(connector);
		let report = pool.initialize(HashMap::from([(84532, url(1))])).await;

		assert!(report.ready.is_empty());
		assert!(matches!(
			&report.failed[0],
			ProviderError::Init {
				chain_id: 84532,
				cause: ChainError::Rejected { code: -32601, .. }
			}
		));
		assert!(pool.configured_chains().is_empty());
	}

	#[tokio::test]
	async fn test_reinitialization_replaces_and_shuts_down_previous() {
		let shutdowns = Arc::new(AtomicUsize::new(0));
		let blocks = Arc::new(AtomicUsize::new(0));
		let mut connector = MockConnector::new();
		let counter = shutdowns.clone();
		let block_source = blocks.clone();
		connector.expect_connect().returning(move |chain, _| {
			let block = block_source.fetch_add(1, Ordering::SeqCst) as u64 + 500;
			Ok(live_client(chain.chain_id, block, counter.clone()))
		});

		let pool = pool(connector);
		pool.initialize(HashMap::from([(84532, url(1))])).await;
		assert_eq!(pool.get_provider(84532).unwrap().block_at_init, 500);

		let report = pool.initialize(HashMap::from([(84532, url(2))])).await;
		assert!(report.is_complete());

		let handle = pool.get_provider(84532).unwrap();
		assert_eq!(handle.block_at_init, 501);
		assert_eq!(handle.rpc_endpoint, url(2));
		assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_failed_reinitialization_removes_stale_handle() {
		let shutdowns = Arc::new(AtomicUsize::new(0));
		let attempts = Arc::new(AtomicUsize::new(0));
		let mut connector = MockConnector::new();
		let counter = shutdowns.clone();
		let attempt_source = attempts.clone();
		connector.expect_connect().returning(move |chain, _| {
			if attempt_source.fetch_add(1, Ordering::SeqCst) == 0 {
				Ok(live_client(chain.chain_id, 7, counter.clone()))
			} else {
				Err(ChainError::Transport {
					chain_id: chain.chain_id,
					reason: "connection reset".to_string(),
				})
			}
		});

		let pool = pool(connector);
		pool.initialize(HashMap::from([(84532, url(1))])).await;
		assert!(pool.get_provider(84532).is_ok());

		let report = pool.initialize(HashMap::from([(84532, url(1))])).await;
		assert_eq!(report.failed_chains(), vec![84532]);
		assert!(pool.get_provider(84532).is_err());
		assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_unregistered_chain_fails_without_connecting() {
		let mut connector = MockConnector::new();
		connector.expect_connect().never();

		let pool = pool(connector);
		let report = pool.initialize(HashMap::from([(424242, url(1))])).await;
		assert!(matches!(
			&report.failed[0],
			ProviderError::Init {
				chain_id: 424242,
				cause: ChainError::InvalidEndpoint { .. }
			}
		));
	}

	#[tokio::test(start_paused = true)]
	async fn test_hanging_liveness_check_times_out() {
		#[derive(Debug)]
		struct HangingConnector;

		#[async_trait]
		impl ChainConnector for HangingConnector {
			async fn connect(
				&self,
				_chain: &ChainDescriptor,
				_rpc_url: &Url,
			) -> ChainResult<Arc<dyn ChainClient>> {
				std::future::pending().await
			}
		}

		let pool = ProviderPool::new(
			Arc::new(ChainRegistry::testnet().unwrap()),
			Arc::new(HangingConnector),
			Duration::from_millis(50),
		);
		let report = pool.initialize(HashMap::from([(10, url(1))])).await;
		assert!(matches!(
			&report.failed[0],
			ProviderError::Init {
				chain_id: 10,
				cause: ChainError::Timeout { .. }
			}
		));
	}

	#[tokio::test]
	async fn test_shutdown_releases_every_handle() {
		let shutdowns = Arc::new(AtomicUsize::new(0));
		let mut connector = MockConnector::new();
		let counter = shutdowns.clone();
		connector
			.expect_connect()
			.returning(move |chain, _| Ok(live_client(chain.chain_id, 1, counter.clone())));

		let pool = pool(connector);
		pool.initialize(HashMap::from([(84532, url(1)), (10, url(2))])).await;
		assert_eq!(pool.configured_chains(), vec![10, 84532]);

		pool.shutdown().await;
		assert!(pool.configured_chains().is_empty());
		assert_eq!(shutdowns.load(Ordering::SeqCst), 2);
	}
}
