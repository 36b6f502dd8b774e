//! Bridge service API trait

use super::{BridgeApiResult, BridgeRoute, DepositStatus, FeeRequest, RelayQuote};
use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use std::fmt::Debug;

/// Read-only view of the bridge service (routes, fee quotes, deposit tracking)
#[async_trait]
pub trait BridgeApi: Send + Sync + Debug {
	/// Routes enabled between two chains for the given token pair
	async fn available_routes(
		&self,
		origin_chain_id: u64,
		destination_chain_id: u64,
		origin_token: Address,
		destination_token: Address,
	) -> BridgeApiResult<Vec<BridgeRoute>>;

	/// Current relay fee quote and deposit limits for a transfer
	async fn suggested_fees(&self, request: &FeeRequest) -> BridgeApiResult<RelayQuote>;

	/// Fill status of a deposit identified by its origin transaction
	async fn deposit_status(
		&self,
		origin_chain_id: u64,
		deposit_tx_hash: TxHash,
	) -> BridgeApiResult<DepositStatus>;
}
