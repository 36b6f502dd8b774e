//! Transfer intents, quotes and execution records

pub mod errors;
pub mod execution;
pub mod quote;

pub use errors::{IntentValidationError, IntentValidationResult};
pub use execution::{ExecutionResult, ExecutionStatus, TransferPlan};
pub use quote::{FeeBreakdown, Quote, QuoteFailureReason};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A request to move `amount` of a token from one chain to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferIntent {
	pub token_symbol: String,
	pub origin_chain_id: u64,
	pub destination_chain_id: u64,
	/// Amount in the token's smallest unit
	pub amount: U256,
	/// Destination address as supplied by the caller
	pub recipient: String,
}

impl TransferIntent {
	pub fn new(
		token_symbol: impl Into<String>,
		origin_chain_id: u64,
		destination_chain_id: u64,
		amount: U256,
		recipient: impl Into<String>,
	) -> Self {
		Self {
			token_symbol: token_symbol.into(),
			origin_chain_id,
			destination_chain_id,
			amount,
			recipient: recipient.into(),
		}
	}

	/// Check the shape of the intent without consulting any registry or network
	pub fn validate(&self) -> IntentValidationResult<()> {
		if self.token_symbol.trim().is_empty() {
			return Err(IntentValidationError::MissingRequiredField {
				field: "token_symbol".to_string(),
			});
		}
		if self.amount.is_zero() {
			return Err(IntentValidationError::ZeroAmount);
		}
		if self.origin_chain_id == self.destination_chain_id {
			return Err(IntentValidationError::SameChain {
				chain_id: self.origin_chain_id,
			});
		}
		self.recipient_address().map(|_| ())
	}

	/// Parse the recipient as a 0x-prefixed 20-byte hex address
	pub fn recipient_address(&self) -> IntentValidationResult<Address> {
		let raw = self.recipient.trim();
		let invalid = || IntentValidationError::InvalidRecipient {
			recipient: self.recipient.clone(),
		};

		let hex = raw
			.strip_prefix("0x")
			.or_else(|| raw.strip_prefix("0X"))
			.ok_or_else(invalid)?;
		if hex.len() != 40 {
			return Err(invalid());
		}
		Address::from_str(raw).map_err(|_| invalid())
	}
}
