//! On-chain access models and traits

pub mod errors;
pub mod traits;

pub use errors::{ChainError, ChainResult, ProviderError};
pub use traits::{ChainClient, ChainConnector};

use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::{Deserialize, Serialize};

/// Arguments of a SpokePool `depositV3` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositCall {
	/// SpokePool contract on the origin chain
	pub spoke_pool: Address,
	pub depositor: Address,
	pub recipient: Address,
	pub input_token: Address,
	pub output_token: Address,
	pub input_amount: U256,
	pub output_amount: U256,
	pub destination_chain_id: u64,
	pub exclusive_relayer: Address,
	pub quote_timestamp: u32,
	pub fill_deadline: u32,
	pub exclusivity_deadline: u32,
	pub message: Bytes,
	/// Native value attached to the transaction (equals `input_amount` for native deposits)
	pub value: U256,
}

/// Summary of a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutcome {
	pub tx_hash: TxHash,
	pub block_number: u64,
	pub succeeded: bool,
	pub gas_used: u64,
}
