//! Error types for registry lookups

use thiserror::Error;

/// Lookup failures in the chain registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
	#[error("Unknown chain: {chain_id}")]
	UnknownChain { chain_id: u64 },

	#[error("Unknown route: token {symbol} is not registered on chain {chain_id}")]
	UnknownRoute { chain_id: u64, symbol: String },

	#[error("Duplicate chain registration: {chain_id}")]
	DuplicateChain { chain_id: u64 },

	#[error("Duplicate token registration: {symbol} on chain {chain_id}")]
	DuplicateToken { chain_id: u64, symbol: String },

	#[error("Invalid RPC endpoint for chain {chain_id}: {reason}")]
	InvalidEndpoint { chain_id: u64, reason: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
