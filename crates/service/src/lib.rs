//! Bridge Service
//!
//! Core orchestration: chain registry, per-chain provider pool, dry-run
//! quoting, execution and error classification.

pub mod classifier;
pub mod executor;
pub mod provider_pool;
pub mod quote_engine;
pub mod registry;
pub mod retry;

pub use classifier::ErrorClassifier;
pub use executor::{BridgeExecutor, ExecutorConfig};
pub use provider_pool::{ProviderHandle, ProviderInitReport, ProviderPool};
pub use quote_engine::{Evaluation, QuoteEngine, QuoteEngineConfig};
pub use registry::{ChainRegistry, ChainRegistryBuilder};
pub use retry::RetryPolicy;
