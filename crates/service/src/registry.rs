//! Chain registry
//!
//! Static table of the chains and tokens the bridge knows about. Built once at
//! startup and shared read-only behind an `Arc`; lookups never touch the
//! network.

use alloy::primitives::address;
use bridge_types::{
	Address, ChainDescriptor, RegistryError, RegistryResult, TokenDescriptor,
};
use std::collections::HashMap;
use url::Url;

/// Lookup table of chains and their tokens
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
	chains: HashMap<u64, ChainDescriptor>,
	/// Keyed by `(chain_id, upper-cased symbol)`
	tokens: HashMap<(u64, String), TokenDescriptor>,
}

fn token_key(chain_id: u64, symbol: &str) -> (u64, String) {
	(chain_id, symbol.trim().to_ascii_uppercase())
}

impl ChainRegistry {
	pub fn builder() -> ChainRegistryBuilder {
		ChainRegistryBuilder::default()
	}

	/// Chain descriptor for `chain_id`
	pub fn resolve_chain(&self, chain_id: u64) -> RegistryResult<&ChainDescriptor> {
		self.chains
			.get(&chain_id)
			.ok_or(RegistryError::UnknownChain { chain_id })
	}

	/// Token descriptor for `symbol` on `chain_id` (symbol match is case-insensitive)
	///
	/// An unknown chain is reported as an unknown route, the pair simply does not exist.
	pub fn resolve_token(&self, chain_id: u64, symbol: &str) -> RegistryResult<&TokenDescriptor> {
		self.tokens
			.get(&token_key(chain_id, symbol))
			.ok_or_else(|| RegistryError::UnknownRoute {
				chain_id,
				symbol: symbol.to_string(),
			})
	}

	/// Address the bridge expects for `token`: the contract itself, or the
	/// chain's wrapped native asset when `token` is native
	pub fn bridge_token_address(&self, token: &TokenDescriptor) -> RegistryResult<Address> {
		match token.contract_address {
			Some(address) => Ok(address),
			None => Ok(self.resolve_chain(token.chain_id)?.wrapped_native),
		}
	}

	pub fn chain_ids(&self) -> Vec<u64> {
		let mut ids: Vec<u64> = self.chains.keys().copied().collect();
		ids.sort_unstable();
		ids
	}

	pub fn tokens_on(&self, chain_id: u64) -> Vec<&TokenDescriptor> {
		let mut tokens: Vec<&TokenDescriptor> = self
			.tokens
			.values()
			.filter(|t| t.chain_id == chain_id)
			.collect();
		tokens.sort_by(|a, b| a.symbol.cmp(&b.symbol));
		tokens
	}

	/// Chains used by the testnet driver: Sepolia, Base Sepolia, Polygon Mumbai,
	/// Arbitrum One and OP Mainnet
	pub fn testnet() -> RegistryResult<Self> {
		let weth_op_stack = address!("4200000000000000000000000000000000000006");
		let weth_arbitrum = address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1");
		let weth_sepolia = address!("fFf9976782d46CC05630D1f6eBAb18b2324d6B14");
		let wmatic_mumbai = address!("9c3C9283D3e44854697Cd22D3Faa240Cfb032889");

		Self::builder()
			.chain(
				11155111,
				"Ethereum Sepolia",
				"https://ethereum-sepolia-rpc.publicnode.com",
				"ETH",
				weth_sepolia,
				true,
			)?
			.native(11155111, "ETH", 18)?
			.erc20(11155111, "WETH", weth_sepolia, 18)?
			.erc20(
				11155111,
				"USDC",
				address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
				6,
			)?
			.chain(84532, "Base Sepolia", "https://sepolia.base.org", "ETH", weth_op_stack, true)?
			.native(84532, "ETH", 18)?
			.erc20(84532, "WETH", weth_op_stack, 18)?
			.erc20(
				84532,
				"USDC",
				address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
				6,
			)?
			.chain(
				80001,
				"Polygon Mumbai",
				"https://rpc-mumbai.maticvigil.com",
				"MATIC",
				wmatic_mumbai,
				true,
			)?
			.native(80001, "MATIC", 18)?
			.erc20(80001, "WMATIC", wmatic_mumbai, 18)?
			.erc20(
				80001,
				"USDC",
				address!("9999f7Fea5938fD3b1E26A12c3f2fb024e194f97"),
				6,
			)?
			.with_arbitrum_one(weth_arbitrum)?
			.with_op_mainnet(weth_op_stack)?
			.build()
	}

	/// Mainnet deployments: Ethereum, Base, Arbitrum One, OP Mainnet and Polygon PoS
	pub fn mainnet() -> RegistryResult<Self> {
		let weth_op_stack = address!("4200000000000000000000000000000000000006");
		let weth_arbitrum = address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1");
		let weth_ethereum = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
		let wpol = address!("0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270");

		Self::builder()
			.chain(
				1,
				"Ethereum",
				"https://ethereum-rpc.publicnode.com",
				"ETH",
				weth_ethereum,
				false,
			)?
			.native(1, "ETH", 18)?
			.erc20(1, "WETH", weth_ethereum, 18)?
			.erc20(1, "USDC", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6)?
			.chain(8453, "Base", "https://mainnet.base.org", "ETH", weth_op_stack, false)?
			.native(8453, "ETH", 18)?
			.erc20(8453, "WETH", weth_op_stack, 18)?
			.erc20(8453, "USDC", address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"), 6)?
			.with_arbitrum_one(weth_arbitrum)?
			.with_op_mainnet(weth_op_stack)?
			.chain(137, "Polygon", "https://polygon-rpc.com", "POL", wpol, false)?
			.native(137, "POL", 18)?
			.erc20(137, "WPOL", wpol, 18)?
			.erc20(137, "WETH", address!("7ceB23fD6bC0adD59E62ac25578270cFf1b9f619"), 18)?
			.erc20(137, "USDC", address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359"), 6)?
			.build()
	}

	pub fn for_network(testnet: bool) -> RegistryResult<Self> {
		if testnet {
			Self::testnet()
		} else {
			Self::mainnet()
		}
	}
}

/// Incremental construction of a [`ChainRegistry`]
#[derive(Debug, Default)]
pub struct ChainRegistryBuilder {
	registry: ChainRegistry,
}

impl ChainRegistryBuilder {
	/// Register a chain; a chain ID can be registered only once
	pub fn add_chain(mut self, chain: ChainDescriptor) -> RegistryResult<Self> {
		if self.registry.chains.contains_key(&chain.chain_id) {
			return Err(RegistryError::DuplicateChain {
				chain_id: chain.chain_id,
			});
		}
		self.registry.chains.insert(chain.chain_id, chain);
		Ok(self)
	}

	/// Register a token; the chain must already be registered
	pub fn add_token(mut self, token: TokenDescriptor) -> RegistryResult<Self> {
		if !self.registry.chains.contains_key(&token.chain_id) {
			return Err(RegistryError::UnknownChain {
				chain_id: token.chain_id,
			});
		}
		let key = token_key(token.chain_id, &token.symbol);
		if self.registry.tokens.contains_key(&key) {
			return Err(RegistryError::DuplicateToken {
				chain_id: token.chain_id,
				symbol: token.symbol,
			});
		}
		self.registry.tokens.insert(key, token);
		Ok(self)
	}

	/// Replace a chain's default RPC endpoint
	pub fn with_rpc_endpoint(mut self, chain_id: u64, endpoint: Url) -> RegistryResult<Self> {
		let chain = self
			.registry
			.chains
			.get_mut(&chain_id)
			.ok_or(RegistryError::UnknownChain { chain_id })?;
		chain.rpc_endpoint = endpoint;
		Ok(self)
	}

	pub fn build(self) -> RegistryResult<ChainRegistry> {
		Ok(self.registry)
	}

	fn chain(
		self,
		chain_id: u64,
		name: &str,
		rpc: &str,
		native_symbol: &str,
		wrapped_native: Address,
		is_testnet: bool,
	) -> RegistryResult<Self> {
		let endpoint = Url::parse(rpc).map_err(|e| RegistryError::InvalidEndpoint {
			chain_id,
			reason: e.to_string(),
		})?;
		self.add_chain(ChainDescriptor::new(
			chain_id,
			name,
			endpoint,
			native_symbol,
			wrapped_native,
			is_testnet,
		))
	}

	fn native(self, chain_id: u64, symbol: &str, decimals: u8) -> RegistryResult<Self> {
		self.add_token(TokenDescriptor::native(chain_id, symbol, decimals))
	}

	fn erc20(
		self,
		chain_id: u64,
		symbol: &str,
		address: Address,
		decimals: u8,
	) -> RegistryResult<Self> {
		self.add_token(TokenDescriptor::erc20(chain_id, symbol, address, decimals))
	}

	fn with_arbitrum_one(self, weth: Address) -> RegistryResult<Self> {
		self.chain(42161, "Arbitrum One", "https://arb1.arbitrum.io/rpc", "ETH", weth, false)?
			.native(42161, "ETH", 18)?
			.erc20(42161, "WETH", weth, 18)?
			.erc20(
				42161,
				"USDC",
				address!("af88d065e77c8cC2239327C5EDb3A432268e5831"),
				6,
			)
	}

	fn with_op_mainnet(self, weth: Address) -> RegistryResult<Self> {
		self.chain(10, "OP Mainnet", "https://mainnet.optimism.io", "ETH", weth, false)?
			.native(10, "ETH", 18)?
			.erc20(10, "WETH", weth, 18)?
			.erc20(
				10,
				"USDC",
				address!("0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
				6,
			)
	}
}
