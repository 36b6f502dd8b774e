//! Error types for chain connectivity and on-chain operations

use alloy::primitives::TxHash;
use thiserror::Error;

/// Failures reported by a [`ChainClient`](super::ChainClient)
///
/// Implementations map their transport's native errors into these variants
/// from the structure of the error (JSON-RPC payload, revert data, elapsed
/// deadline), never from message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
	#[error("RPC transport failure on chain {chain_id}: {reason}")]
	Transport { chain_id: u64, reason: String },

	#[error("RPC request rejected on chain {chain_id} (code {code}): {message}")]
	Rejected {
		chain_id: u64,
		code: i64,
		message: String,
	},

	#[error("Execution reverted on chain {chain_id}: {reason}")]
	Reverted {
		chain_id: u64,
		tx_hash: Option<TxHash>,
		reason: String,
	},

	#[error("Insufficient funds on chain {chain_id}: {reason}")]
	InsufficientFunds { chain_id: u64, reason: String },

	#[error("{operation} timed out on chain {chain_id} after {timeout_ms}ms")]
	Timeout {
		chain_id: u64,
		operation: String,
		timeout_ms: u64,
	},

	/// A submission did not return in time; the transaction may still have
	/// been broadcast, so it must not be resubmitted blindly
	#[error("{operation} on chain {chain_id} unconfirmed after {timeout_ms}ms")]
	SubmissionUnconfirmed {
		chain_id: u64,
		operation: String,
		timeout_ms: u64,
	},

	#[error("Invalid RPC endpoint for chain {chain_id}: {reason}")]
	InvalidEndpoint { chain_id: u64, reason: String },

	#[error("Signer error: {0}")]
	Signer(String),

	#[error("Malformed chain response on chain {chain_id}: {reason}")]
	Decode { chain_id: u64, reason: String },
}

impl ChainError {
	pub fn timeout(chain_id: u64, operation: impl Into<String>, timeout_ms: u64) -> Self {
		Self::Timeout {
			chain_id,
			operation: operation.into(),
			timeout_ms,
		}
	}

	/// Chain the error originated from, when known
	pub fn chain_id(&self) -> Option<u64> {
		match self {
			ChainError::Transport { chain_id, .. }
			| ChainError::Rejected { chain_id, .. }
			| ChainError::Reverted { chain_id, .. }
			| ChainError::InsufficientFunds { chain_id, .. }
			| ChainError::Timeout { chain_id, .. }
			| ChainError::SubmissionUnconfirmed { chain_id, .. }
			| ChainError::InvalidEndpoint { chain_id, .. }
			| ChainError::Decode { chain_id, .. } => Some(*chain_id),
			ChainError::Signer(_) => None,
		}
	}
}

pub type ChainResult<T> = Result<T, ChainError>;

/// Provider pool failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
	#[error("Provider initialization failed for chain {chain_id}: {cause}")]
	Init {
		chain_id: u64,
		#[source]
		cause: ChainError,
	},

	#[error("No provider configured for chain {chain_id}")]
	NotConfigured { chain_id: u64 },
}

impl ProviderError {
	pub fn chain_id(&self) -> u64 {
		match self {
			ProviderError::Init { chain_id, .. } | ProviderError::NotConfigured { chain_id } => {
				*chain_id
			},
		}
	}
}
