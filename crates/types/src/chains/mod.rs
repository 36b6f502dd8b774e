//! Chain and token descriptor models

pub mod errors;

pub use errors::{RegistryError, RegistryResult};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use url::Url;

/// A chain the bridge engine knows how to talk to
///
/// Descriptors are created once when the registry is built and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainDescriptor {
	/// EIP-155 chain ID (e.g., 84532 for Base Sepolia)
	pub chain_id: u64,
	/// Human-readable name (e.g., "Base Sepolia")
	pub name: String,
	/// JSON-RPC endpoint used when no override is configured
	pub rpc_endpoint: Url,
	/// Symbol of the gas asset (e.g., "ETH", "MATIC")
	pub native_symbol: String,
	/// Wrapped form of the gas asset, used as the Across input token for native deposits
	pub wrapped_native: Address,
	/// Whether the chain is a testnet
	pub is_testnet: bool,
}

impl ChainDescriptor {
	pub fn new(
		chain_id: u64,
		name: impl Into<String>,
		rpc_endpoint: Url,
		native_symbol: impl Into<String>,
		wrapped_native: Address,
		is_testnet: bool,
	) -> Self {
		Self {
			chain_id,
			name: name.into(),
			rpc_endpoint,
			native_symbol: native_symbol.into(),
			wrapped_native,
			is_testnet,
		}
	}
}

/// A token registered on one chain
///
/// `(chain_id, symbol)` is unique within a registry. A `None` contract address
/// marks the chain's native asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TokenDescriptor {
	pub chain_id: u64,
	pub symbol: String,
	pub contract_address: Option<Address>,
	pub decimals: u8,
}

impl TokenDescriptor {
	/// ERC-20 token at a contract address
	pub fn erc20(chain_id: u64, symbol: impl Into<String>, address: Address, decimals: u8) -> Self {
		Self {
			chain_id,
			symbol: symbol.into(),
			contract_address: Some(address),
			decimals,
		}
	}

	/// The chain's native gas asset
	pub fn native(chain_id: u64, symbol: impl Into<String>, decimals: u8) -> Self {
		Self {
			chain_id,
			symbol: symbol.into(),
			contract_address: None,
			decimals,
		}
	}

	pub fn is_native(&self) -> bool {
		self.contract_address.is_none()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::address;

	#[test]
	fn test_token_descriptor_nativeness() {
		let eth = TokenDescriptor::native(11155111, "ETH", 18);
		assert!(eth.is_native());

		let usdc = TokenDescriptor::erc20(
			84532,
			"USDC",
			address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
			6,
		);
		assert!(!usdc.is_native());
		assert_eq!(usdc.decimals, 6);
	}
}
