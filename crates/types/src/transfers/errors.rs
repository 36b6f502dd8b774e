//! Error types for transfer intent validation

use thiserror::Error;

/// Reasons a transfer intent is rejected before any network activity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentValidationError {
	#[error("Invalid amount: must be greater than zero")]
	ZeroAmount,

	#[error("Origin and destination chains must differ (both are {chain_id})")]
	SameChain { chain_id: u64 },

	#[error("Invalid recipient address: {recipient}")]
	InvalidRecipient { recipient: String },

	#[error("Missing required field: {field}")]
	MissingRequiredField { field: String },

	#[error("Token {symbol} is not registered on chain {chain_id}")]
	UnknownToken { chain_id: u64, symbol: String },
}

pub type IntentValidationResult<T> = Result<T, IntentValidationError>;
