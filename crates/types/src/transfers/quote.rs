//! Dry-run quote model

use super::TransferIntent;
use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Why a dry run concluded the transfer cannot proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteFailureReason {
	InvalidIntent,
	ProviderUnavailable,
	InsufficientBalance,
	UnsupportedRoute,
	AmountOutOfRange,
	NetworkError,
}

impl fmt::Display for QuoteFailureReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			QuoteFailureReason::InvalidIntent => "invalid intent",
			QuoteFailureReason::ProviderUnavailable => "provider unavailable",
			QuoteFailureReason::InsufficientBalance => "insufficient balance",
			QuoteFailureReason::UnsupportedRoute => "unsupported route",
			QuoteFailureReason::AmountOutOfRange => "amount out of range",
			QuoteFailureReason::NetworkError => "network error",
		};
		f.write_str(name)
	}
}

/// Fee components of a quote
///
/// Relay and protocol fees are denominated in the bridged token; gas values
/// refer to the origin chain's native asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
	pub relay_fee: U256,
	/// Liquidity provider fee charged by the bridge
	pub protocol_fee: U256,
	/// `gas_units * gas_price`, in wei
	pub gas_cost: U256,
	pub gas_price: u128,
	pub gas_units: u64,
}

/// Result of a dry run
///
/// A quote is a snapshot. It is produced fresh by every dry run and is never
/// reused to authorize an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
	pub quote_id: String,
	pub token_symbol: String,
	pub origin_chain_id: u64,
	pub destination_chain_id: u64,
	pub amount: U256,
	pub fees: FeeBreakdown,
	/// Amount delivered to the recipient after relay fees
	pub output_amount: U256,
	pub estimated_fill_time_seconds: u64,
	/// Whether an ERC-20 approval must precede the deposit
	pub requires_approval: bool,
	pub can_proceed: bool,
	pub failure_reason: Option<QuoteFailureReason>,
	pub error: Option<String>,
	pub quoted_at: DateTime<Utc>,
}

impl Quote {
	/// Negative quote carrying the reason and a human-readable message
	pub fn rejected(
		intent: &TransferIntent,
		reason: QuoteFailureReason,
		message: impl Into<String>,
	) -> Self {
		Self {
			quote_id: Uuid::new_v4().to_string(),
			token_symbol: intent.token_symbol.clone(),
			origin_chain_id: intent.origin_chain_id,
			destination_chain_id: intent.destination_chain_id,
			amount: intent.amount,
			fees: FeeBreakdown::default(),
			output_amount: U256::ZERO,
			estimated_fill_time_seconds: 0,
			requires_approval: false,
			can_proceed: false,
			failure_reason: Some(reason),
			error: Some(message.into()),
			quoted_at: Utc::now(),
		}
	}

	/// Positive quote with the full fee breakdown
	pub fn feasible(
		intent: &TransferIntent,
		quote_id: Option<String>,
		fees: FeeBreakdown,
		output_amount: U256,
		estimated_fill_time_seconds: u64,
		requires_approval: bool,
	) -> Self {
		Self {
			quote_id: quote_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
			token_symbol: intent.token_symbol.clone(),
			origin_chain_id: intent.origin_chain_id,
			destination_chain_id: intent.destination_chain_id,
			amount: intent.amount,
			fees,
			output_amount,
			estimated_fill_time_seconds,
			requires_approval,
			can_proceed: true,
			failure_reason: None,
			error: None,
			quoted_at: Utc::now(),
		}
	}
}
