//! EVM chain client backed by alloy
//!
//! One [`EvmChainClient`] per chain, all sharing the connector's local
//! private-key signer. RPC failures are mapped into [`ChainError`] from the
//! JSON-RPC error payload (code and revert data), not from message text.

use crate::bindings::{ISpokePool, IERC20};
use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use bridge_types::{
	Address, ChainClient, ChainConnector, ChainDescriptor, ChainError, ChainResult, DepositCall,
	SecretString, TransactionOutcome, TxHash, U256,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

const TRACING_TARGET: &str = "bridge_adapters::evm";

/// JSON-RPC error code geth and most clients use for execution reverts
const EXECUTION_REVERTED_CODE: i64 = 3;

/// Delay between receipt lookups while waiting for confirmations
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Map a JSON-RPC failure into the chain error taxonomy
pub(crate) fn rpc_error(chain_id: u64, err: RpcError<TransportErrorKind>) -> ChainError {
	if let Some(payload) = err.as_error_resp() {
		if payload.code == EXECUTION_REVERTED_CODE || payload.as_revert_data().is_some() {
			return ChainError::Reverted {
				chain_id,
				tx_hash: None,
				reason: payload.message.to_string(),
			};
		}
		return ChainError::Rejected {
			chain_id,
			code: payload.code,
			message: payload.message.to_string(),
		};
	}

	match err {
		RpcError::Transport(kind) => ChainError::Transport {
			chain_id,
			reason: kind.to_string(),
		},
		RpcError::NullResp | RpcError::DeserError { .. } | RpcError::SerError(_) => {
			ChainError::Decode {
				chain_id,
				reason: err.to_string(),
			}
		},
		other => ChainError::Transport {
			chain_id,
			reason: other.to_string(),
		},
	}
}

fn contract_error(chain_id: u64, err: alloy::contract::Error) -> ChainError {
	match err {
		alloy::contract::Error::TransportError(e) => rpc_error(chain_id, e),
		other => ChainError::Decode {
			chain_id,
			reason: other.to_string(),
		},
	}
}

/// alloy-backed [`ChainClient`]
#[derive(Clone)]
pub struct EvmChainClient {
	chain_id: u64,
	signer: Address,
	provider: DynProvider,
	receipt_poll_interval: Duration,
}

impl fmt::Debug for EvmChainClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EvmChainClient")
			.field("chain_id", &self.chain_id)
			.field("signer", &self.signer)
			.finish_non_exhaustive()
	}
}

impl EvmChainClient {
	fn erc20(&self, token: Address) -> IERC20::IERC20Instance<DynProvider> {
		IERC20::new(token, self.provider.clone())
	}

	fn spoke_pool(&self, address: Address) -> ISpokePool::ISpokePoolInstance<DynProvider> {
		ISpokePool::new(address, self.provider.clone())
	}
}

#[async_trait]
impl ChainClient for EvmChainClient {
	fn chain_id(&self) -> u64 {
		self.chain_id
	}

	fn signer_address(&self) -> Address {
		self.signer
	}

	async fn block_number(&self) -> ChainResult<u64> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| rpc_error(self.chain_id, e))
	}

	async fn native_balance(&self, owner: Address) -> ChainResult<U256> {
		self.provider
			.get_balance(owner)
			.await
			.map_err(|e| rpc_error(self.chain_id, e))
	}

	async fn token_balance(&self, token: Address, owner: Address) -> ChainResult<U256> {
		self.erc20(token)
			.balanceOf(owner)
			.call()
			.await
			.map_err(|e| contract_error(self.chain_id, e))
	}

	async fn allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> ChainResult<U256> {
		self.erc20(token)
			.allowance(owner, spender)
			.call()
			.await
			.map_err(|e| contract_error(self.chain_id, e))
	}

	async fn gas_price(&self) -> ChainResult<u128> {
		self.provider
			.get_gas_price()
			.await
			.map_err(|e| rpc_error(self.chain_id, e))
	}

	async fn estimate_approval_gas(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> ChainResult<u64> {
		self.erc20(token)
			.approve(spender, amount)
			.from(self.signer)
			.estimate_gas()
			.await
			.map_err(|e| contract_error(self.chain_id, e))
	}

	async fn estimate_deposit_gas(&self, deposit: &DepositCall) -> ChainResult<u64> {
		let pool = self.spoke_pool(deposit.spoke_pool);
		pool.depositV3(
			deposit.depositor,
			deposit.recipient,
			deposit.input_token,
			deposit.output_token,
			deposit.input_amount,
			deposit.output_amount,
			U256::from(deposit.destination_chain_id),
			deposit.exclusive_relayer,
			deposit.quote_timestamp,
			deposit.fill_deadline,
			deposit.exclusivity_deadline,
			deposit.message.clone(),
		)
		.value(deposit.value)
		.from(self.signer)
		.estimate_gas()
		.await
		.map_err(|e| contract_error(self.chain_id, e))
	}

	async fn submit_approval(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> ChainResult<TxHash> {
		let pending = self
			.erc20(token)
			.approve(spender, amount)
			.from(self.signer)
			.send()
			.await
			.map_err(|e| contract_error(self.chain_id, e))?;

		let tx_hash = *pending.tx_hash();
		debug!(
			target: TRACING_TARGET,
			chain_id = self.chain_id,
			tx_hash = %tx_hash,
			"Approval broadcast"
		);
		Ok(tx_hash)
	}

	async fn submit_deposit(&self, deposit: &DepositCall) -> ChainResult<TxHash> {
		let pool = self.spoke_pool(deposit.spoke_pool);
		let pending = pool
			.depositV3(
				deposit.depositor,
				deposit.recipient,
				deposit.input_token,
				deposit.output_token,
				deposit.input_amount,
				deposit.output_amount,
				U256::from(deposit.destination_chain_id),
				deposit.exclusive_relayer,
				deposit.quote_timestamp,
				deposit.fill_deadline,
				deposit.exclusivity_deadline,
				deposit.message.clone(),
			)
			.value(deposit.value)
			.from(self.signer)
			.send()
			.await
			.map_err(|e| contract_error(self.chain_id, e))?;

		let tx_hash = *pending.tx_hash();
		debug!(
			target: TRACING_TARGET,
			chain_id = self.chain_id,
			tx_hash = %tx_hash,
			"Deposit broadcast"
		);
		Ok(tx_hash)
	}

	async fn wait_for_confirmations(
		&self,
		tx_hash: TxHash,
		confirmations: u64,
		timeout: Duration,
	) -> ChainResult<TransactionOutcome> {
		let poll = async {
			loop {
				match self.provider.get_transaction_receipt(tx_hash).await {
					Ok(Some(receipt)) => {
						let mined_in = receipt.block_number().unwrap_or_default();
						let head = self
							.provider
							.get_block_number()
							.await
							.map_err(|e| rpc_error(self.chain_id, e))?;
						if head + 1 >= mined_in + confirmations.max(1) {
							return Ok(TransactionOutcome {
								tx_hash,
								block_number: mined_in,
								succeeded: receipt.status(),
								gas_used: receipt.gas_used(),
							});
						}
					},
					Ok(None) => {},
					Err(e) => match rpc_error(self.chain_id, e) {
						err @ ChainError::Transport { .. } => {
							debug!(
								target: TRACING_TARGET,
								tx_hash = %tx_hash,
								"Receipt poll failed, retrying: {}",
								err
							)
						},
						err => return Err(err),
					},
				}
				tokio::time::sleep(self.receipt_poll_interval).await;
			}
		};

		tokio::time::timeout(timeout, poll).await.unwrap_or_else(|_| {
			Err(ChainError::timeout(
				self.chain_id,
				"wait_for_confirmations",
				u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
			))
		})
	}

	async fn shutdown(&self) {
		debug!(target: TRACING_TARGET, chain_id = self.chain_id, "Releasing EVM provider");
	}
}

/// Opens [`EvmChainClient`]s for a single signing credential
#[derive(Clone)]
pub struct EvmConnector {
	signer: PrivateKeySigner,
	receipt_poll_interval: Duration,
}

impl fmt::Debug for EvmConnector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EvmConnector")
			.field("signer", &self.signer.address())
			.finish_non_exhaustive()
	}
}

impl EvmConnector {
	/// Parse a hex private key (with or without `0x`)
	pub fn new(signing_key: &SecretString) -> ChainResult<Self> {
		let signer = PrivateKeySigner::from_str(signing_key.expose_secret().trim())
			.map_err(|e| ChainError::Signer(e.to_string()))?;
		Ok(Self {
			signer,
			receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
		})
	}

	pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
		self.receipt_poll_interval = interval;
		self
	}

	pub fn receipt_poll_interval(&self) -> Duration {
		self.receipt_poll_interval
	}

	pub fn signer_address(&self) -> Address {
		self.signer.address()
	}
}

#[async_trait]
impl ChainConnector for EvmConnector {
	async fn connect(
		&self,
		chain: &ChainDescriptor,
		rpc_url: &Url,
	) -> ChainResult<Arc<dyn ChainClient>> {
		if !matches!(rpc_url.scheme(), "http" | "https") {
			return Err(ChainError::InvalidEndpoint {
				chain_id: chain.chain_id,
				reason: format!("unsupported scheme '{}'", rpc_url.scheme()),
			});
		}

		let wallet = EthereumWallet::from(self.signer.clone());
		let provider = ProviderBuilder::new()
			.wallet(wallet)
			.connect_http(rpc_url.clone())
			.erased();

		let served = provider
			.get_chain_id()
			.await
			.map_err(|e| rpc_error(chain.chain_id, e))?;
		if served != chain.chain_id {
			return Err(ChainError::InvalidEndpoint {
				chain_id: chain.chain_id,
				reason: format!("endpoint serves chain {}", served),
			});
		}

		debug!(
			target: TRACING_TARGET,
			chain_id = chain.chain_id,
			name = %chain.name,
			"Connected EVM provider"
		);
		Ok(Arc::new(EvmChainClient {
			chain_id: chain.chain_id,
			signer: self.signer.address(),
			provider,
			receipt_poll_interval: self.receipt_poll_interval,
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::rpc::json_rpc::ErrorPayload;

	// anvil's first dev account
	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn payload(code: i64, message: &'static str) -> RpcError<TransportErrorKind> {
		RpcError::ErrorResp(ErrorPayload {
			code,
			message: message.into(),
			data: None,
		})
	}

	#[test]
	fn test_revert_code_maps_to_reverted() {
		let err = rpc_error(84532, payload(3, "execution reverted"));
		assert!(matches!(err, ChainError::Reverted { chain_id: 84532, .. }));
	}

	#[test]
	fn test_other_codes_map_to_rejected() {
		let err = rpc_error(10, payload(-32003, "transaction rejected"));
		assert_eq!(
			err,
			ChainError::Rejected {
				chain_id: 10,
				code: -32003,
				message: "transaction rejected".to_string()
			}
		);
	}

	#[test]
	fn test_transport_failures_map_to_transport() {
		let err = rpc_error(
			11155111,
			RpcError::Transport(TransportErrorKind::BackendGone),
		);
		assert!(matches!(err, ChainError::Transport { chain_id: 11155111, .. }));
	}

	#[test]
	fn test_connector_parses_key() {
		let connector = EvmConnector::new(&SecretString::from(DEV_KEY)).unwrap();
		assert_eq!(
			connector.signer_address(),
			Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
		);

		let bad = EvmConnector::new(&SecretString::from("0x1234"));
		assert!(matches!(bad, Err(ChainError::Signer(_))));
	}

	#[test]
	fn test_connector_receipt_poll_interval() {
		let connector = EvmConnector::new(&SecretString::from(DEV_KEY)).unwrap();
		assert_eq!(connector.receipt_poll_interval(), DEFAULT_RECEIPT_POLL_INTERVAL);

		let connector = connector.with_receipt_poll_interval(Duration::from_millis(250));
		assert_eq!(connector.receipt_poll_interval(), Duration::from_millis(250));
	}

	#[tokio::test]
	async fn test_connector_rejects_non_http_endpoint() {
		let connector = EvmConnector::new(&SecretString::from(DEV_KEY)).unwrap();
		let chain = ChainDescriptor::new(
			84532,
			"Base Sepolia",
			Url::parse("https://sepolia.base.org").unwrap(),
			"ETH",
			Address::from_str("0x4200000000000000000000000000000000000006").unwrap(),
			true,
		);

		let result = connector
			.connect(&chain, &Url::parse("ws://127.0.0.1:8546").unwrap())
			.await;
		assert!(matches!(result, Err(ChainError::InvalidEndpoint { .. })));
	}
}
