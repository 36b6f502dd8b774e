//! Chain access traits
//!
//! The engine never talks to an RPC library directly. Everything it needs from
//! a chain goes through [`ChainClient`], and connections are opened through a
//! [`ChainConnector`], so the orchestration logic can be exercised against
//! in-memory fakes.

use super::{ChainResult, DepositCall, TransactionOutcome};
use crate::ChainDescriptor;
use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Read and write access to a single chain on behalf of one signing credential
#[async_trait]
pub trait ChainClient: Send + Sync + Debug {
	/// Chain this client is bound to
	fn chain_id(&self) -> u64;

	/// Address of the signing credential that pays for and signs transactions
	fn signer_address(&self) -> Address;

	/// Latest block height, used as the liveness probe
	async fn block_number(&self) -> ChainResult<u64>;

	/// Native asset balance in wei
	async fn native_balance(&self, owner: Address) -> ChainResult<U256>;

	/// ERC-20 `balanceOf`
	async fn token_balance(&self, token: Address, owner: Address) -> ChainResult<U256>;

	/// ERC-20 `allowance`
	async fn allowance(&self, token: Address, owner: Address, spender: Address)
		-> ChainResult<U256>;

	/// Current gas price in wei
	async fn gas_price(&self) -> ChainResult<u128>;

	/// Gas units for `approve(spender, amount)` sent by the signer
	async fn estimate_approval_gas(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> ChainResult<u64>;

	/// Gas units for the SpokePool deposit sent by the signer
	async fn estimate_deposit_gas(&self, deposit: &DepositCall) -> ChainResult<u64>;

	/// Sign and broadcast `approve(spender, amount)`, returning once the node accepted it
	async fn submit_approval(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> ChainResult<TxHash>;

	/// Sign and broadcast the SpokePool deposit, returning once the node accepted it
	async fn submit_deposit(&self, deposit: &DepositCall) -> ChainResult<TxHash>;

	/// Wait until `tx_hash` is mined with at least `confirmations` blocks on top
	async fn wait_for_confirmations(
		&self,
		tx_hash: TxHash,
		confirmations: u64,
		timeout: Duration,
	) -> ChainResult<TransactionOutcome>;

	/// Release any resources held by the connection
	async fn shutdown(&self) {}
}

/// Opens [`ChainClient`] connections for configured endpoints
#[async_trait]
pub trait ChainConnector: Send + Sync + Debug {
	async fn connect(
		&self,
		chain: &ChainDescriptor,
		rpc_url: &Url,
	) -> ChainResult<Arc<dyn ChainClient>>;
}
