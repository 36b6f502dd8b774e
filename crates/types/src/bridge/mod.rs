//! Bridge service models
//!
//! Typed views of the Across REST API responses that the engine consumes.
//! Wire formats live in the adapter; these are already parsed into chain
//! primitives.

pub mod errors;
pub mod traits;

pub use errors::{BridgeApiError, BridgeApiResult};
pub use traits::BridgeApi;

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

/// An enabled origin/destination token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRoute {
	pub origin_chain_id: u64,
	pub destination_chain_id: u64,
	pub origin_token: Address,
	pub destination_token: Address,
	pub origin_token_symbol: String,
	pub is_native: bool,
}

/// Parameters of a fee quote request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRequest {
	pub input_token: Address,
	pub output_token: Address,
	pub origin_chain_id: u64,
	pub destination_chain_id: u64,
	pub amount: U256,
	pub depositor: Option<Address>,
	pub recipient: Option<Address>,
}

/// Deposit limits reported alongside a quote, in input token base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DepositLimits {
	pub min_deposit: U256,
	pub max_deposit: U256,
	pub max_deposit_instant: U256,
}

impl DepositLimits {
	pub fn contains(&self, amount: U256) -> bool {
		amount >= self.min_deposit && amount <= self.max_deposit
	}
}

/// Relay fee quote for one transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayQuote {
	/// Quote identifier assigned by the service, when it returns one
	pub quote_id: Option<String>,
	/// Total fee deducted by the relay, in input token base units
	pub total_relay_fee: U256,
	pub relayer_capital_fee: U256,
	pub relayer_gas_fee: U256,
	/// Liquidity provider fee, in input token base units
	pub lp_fee: U256,
	/// Amount the recipient receives on the destination chain
	pub output_amount: U256,
	pub estimated_fill_time_seconds: u64,
	/// Quote timestamp to pass to the deposit
	pub timestamp: u32,
	pub fill_deadline: u32,
	pub exclusive_relayer: Address,
	pub exclusivity_deadline: u32,
	/// SpokePool on the origin chain that must receive the deposit
	pub spoke_pool: Address,
	pub limits: DepositLimits,
	pub is_amount_too_low: bool,
}

/// Fill lifecycle of a deposit as reported by the bridge service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStatus {
	Pending,
	Filled,
	Expired,
	Refunded,
}

impl FillStatus {
	/// Whether the deposit will never be filled
	pub fn is_failure(&self) -> bool {
		matches!(self, FillStatus::Expired | FillStatus::Refunded)
	}
}

/// Deposit tracking record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositStatus {
	pub status: FillStatus,
	pub deposit_id: Option<String>,
	pub fill_tx_hash: Option<TxHash>,
	pub destination_chain_id: Option<u64>,
}

impl DepositStatus {
	pub fn pending() -> Self {
		Self {
			status: FillStatus::Pending,
			deposit_id: None,
			fill_tx_hash: None,
			destination_chain_id: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_deposit_limits_inclusive_bounds() {
		let limits = DepositLimits {
			min_deposit: U256::from(1_000_000u64),
			max_deposit: U256::from(5_000_000_000u64),
			max_deposit_instant: U256::from(1_000_000_000u64),
		};
		assert!(limits.contains(U256::from(1_000_000u64)));
		assert!(limits.contains(U256::from(5_000_000_000u64)));
		assert!(!limits.contains(U256::from(999_999u64)));
		assert!(!limits.contains(U256::from(5_000_000_001u64)));
	}

	#[test]
	fn test_fill_status_wire_names() {
		let status: FillStatus = serde_json::from_str("\"refunded\"").unwrap();
		assert_eq!(status, FillStatus::Refunded);
		assert!(status.is_failure());
		assert!(!FillStatus::Pending.is_failure());
		assert!(!FillStatus::Filled.is_failure());
	}
}
