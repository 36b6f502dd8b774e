//! Bridge Types
//!
//! Shared models, the closed error taxonomy and the seam traits of the Across
//! bridge engine. Nothing in this crate performs I/O.

pub mod bridge;
pub mod chains;
pub mod classification;
pub mod errors;
pub mod models;
pub mod providers;
pub mod transfers;

// Re-export chain primitives so downstream crates agree on one alloy version
pub use alloy::primitives::{Address, Bytes, TxHash, U256};
pub use chrono;

pub use bridge::{
	BridgeApi, BridgeApiError, BridgeApiResult, BridgeRoute, DepositLimits, DepositStatus,
	FeeRequest, FillStatus, RelayQuote,
};

pub use chains::{ChainDescriptor, RegistryError, RegistryResult, TokenDescriptor};

pub use classification::{ErrorClassification, ErrorKind};

pub use errors::{BridgeError, BridgeResult, ExecutionStage};

pub use models::SecretString;

pub use providers::{
	ChainClient, ChainConnector, ChainError, ChainResult, DepositCall, ProviderError,
	TransactionOutcome,
};

pub use transfers::{
	ExecutionResult, ExecutionStatus, FeeBreakdown, IntentValidationError,
	IntentValidationResult, Quote, QuoteFailureReason, TransferIntent, TransferPlan,
};
