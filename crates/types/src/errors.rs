//! Unified error type for bridge operations

use crate::bridge::BridgeApiError;
use crate::chains::RegistryError;
use crate::providers::{ChainError, ProviderError};
use crate::transfers::{IntentValidationError, QuoteFailureReason};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Step of an execution at which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStage {
	Validation,
	Approval,
	Deposit,
}

impl fmt::Display for ExecutionStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExecutionStage::Validation => write!(f, "validation"),
			ExecutionStage::Approval => write!(f, "approval"),
			ExecutionStage::Deposit => write!(f, "deposit"),
		}
	}
}

/// Every failure the engine surfaces to callers
#[derive(Error, Debug)]
pub enum BridgeError {
	#[error("Configuration error: {reason}")]
	Configuration { reason: String },

	#[error("Registry error: {0}")]
	Registry(#[from] RegistryError),

	#[error("Provider error: {0}")]
	Provider(#[from] ProviderError),

	#[error("Invalid transfer intent: {0}")]
	Validation(#[from] IntentValidationError),

	#[error("Chain error: {0}")]
	Chain(#[from] ChainError),

	#[error("Bridge API error: {0}")]
	BridgeApi(#[from] BridgeApiError),

	#[error("Quote rejected ({reason}): {message}")]
	QuoteRejected {
		reason: QuoteFailureReason,
		message: String,
	},

	#[error("Execution failed at {stage} stage: {cause}")]
	ExecutionFailed {
		stage: ExecutionStage,
		#[source]
		cause: Box<BridgeError>,
	},

	#[error("{operation} timed out after {timeout_ms}ms")]
	Timeout { operation: String, timeout_ms: u64 },
}

impl BridgeError {
	pub fn execution_failed(stage: ExecutionStage, cause: impl Into<BridgeError>) -> Self {
		Self::ExecutionFailed {
			stage,
			cause: Box::new(cause.into()),
		}
	}

	pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
		Self::Timeout {
			operation: operation.into(),
			timeout_ms,
		}
	}

	/// Innermost error beneath any `ExecutionFailed` wrappers
	pub fn root_cause(&self) -> &BridgeError {
		match self {
			BridgeError::ExecutionFailed { cause, .. } => cause.root_cause(),
			other => other,
		}
	}

	/// Stage of the outermost `ExecutionFailed` wrapper, if any
	pub fn stage(&self) -> Option<ExecutionStage> {
		match self {
			BridgeError::ExecutionFailed { stage, .. } => Some(*stage),
			_ => None,
		}
	}
}

pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_root_cause_unwraps_nesting() {
		let inner = ChainError::InsufficientFunds {
			chain_id: 84532,
			reason: "gas * price + value exceeds balance".to_string(),
		};
		let err = BridgeError::execution_failed(
			ExecutionStage::Deposit,
			BridgeError::execution_failed(ExecutionStage::Approval, inner.clone()),
		);

		assert_eq!(err.stage(), Some(ExecutionStage::Deposit));
		assert!(matches!(err.root_cause(), BridgeError::Chain(e) if *e == inner));
	}

	#[test]
	fn test_display_includes_stage() {
		let err = BridgeError::execution_failed(
			ExecutionStage::Validation,
			BridgeError::QuoteRejected {
				reason: QuoteFailureReason::UnsupportedRoute,
				message: "no route".to_string(),
			},
		);
		let text = err.to_string();
		assert!(text.contains("validation stage"));
		assert!(text.contains("unsupported route"));
	}
}
