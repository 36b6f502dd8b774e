//! Bridge Adapters
//!
//! Network-facing implementations of the engine's seam traits: the Across REST
//! API client and the alloy-backed EVM chain client.

pub mod across;
pub mod bindings;
pub mod evm;

pub use across::AcrossClient;
pub use evm::{EvmChainClient, EvmConnector, DEFAULT_RECEIPT_POLL_INTERVAL};
